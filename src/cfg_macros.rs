#![allow(unused_macros)]

macro_rules! cfg_wasm {
    ($($item:item)*) => {
        $(
            #[cfg(feature = "wasm")]
            $item
        )*
    }
}

macro_rules! wasm_tests {

    ( $( #[test] $($item:item)?)*) => {
        $(
            #[cfg_attr(target_family = "wasm", wasm_bindgen_test::wasm_bindgen_test)]
            #[test]
            $($item)?
        )*
    };

}

// Logging call sites compile to nothing unless the `logging` feature is enabled.
macro_rules! log_debug {
    ($($arg:tt)+) => {
        #[cfg(feature = "logging")]
        log::debug!($($arg)+);
    };
}

macro_rules! log_trace {
    ($($arg:tt)+) => {
        #[cfg(feature = "logging")]
        log::trace!($($arg)+);
    };
}
