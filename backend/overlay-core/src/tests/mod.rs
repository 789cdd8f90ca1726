mod dispatch;
mod support;
