pub mod slot;
pub mod stream;
pub mod text;
