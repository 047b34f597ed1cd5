mod gateway;
mod process_gateway;
