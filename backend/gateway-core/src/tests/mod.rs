mod client;
mod engine;
mod name;
