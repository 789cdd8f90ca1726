mod builder;
mod from_voice_state;
