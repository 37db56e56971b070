mod core;


pub use self::core::{HEADER_LEN, Header, MAGIC};
