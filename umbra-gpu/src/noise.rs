mod blue;

pub use self::blue::*;
