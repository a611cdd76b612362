//! 한글 자모 primitive와 음운 판정

pub mod phonology;
pub mod unicode;
