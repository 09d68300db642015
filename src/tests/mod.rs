mod stack;
mod transport;
