pub mod eip1193;

pub use self::eip1193::{Eip1193Provider, RequestArguments, ethereum};
