mod connector_tests {
    pub mod helpers;

    mod connector;
}

mod error {
    mod auth;
    mod rpc;
}
