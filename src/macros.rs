// src/macros.rs

/// `String` shorthand: `s!()` is empty, `s!(x)` is `String::from(x)`.
#[macro_export]
macro_rules! s {
    () => {
        ::std::string::String::new()
    };
    ($expr:expr) => {
        ::std::string::String::from($expr)
    };
}

/// Build one table row (`Vec<String>`) from anything `ToString`.
#[macro_export]
macro_rules! cells {
    ($($cell:expr),* $(,)?) => {
        ::std::vec![$(::std::string::ToString::to_string(&$cell)),*]
    };
}
