/// Macro used for generating the table of known OpenGL entry points.
///
/// The OpenGL implementation for a computer actually lives in its graphics driver, and which
/// functions a driver exposes depends on the API version it supports. Rather than declaring a
/// function pointer slot per entry point, each version block lists the names it introduced and
/// this macro generates:
///
/// - `Symbol`, an enum with one variant per entry point, usable as a typed key into the
///   `FunctionTable`. `symbol as usize` is the symbol's index in `SYMBOLS`.
/// - `SYMBOLS`, a slice of `SymbolInfo` holding the name and the version that introduced it,
///   in declaration order.
///
/// Names must be unique across all blocks.
macro_rules! gl_symbols {
    ( $( $version:ident { $( $name:ident ),* $(,)* } )* ) => {
        #[allow(non_camel_case_types)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum Symbol {
            $( $( $name, )* )*
        }

        pub static SYMBOLS: &[SymbolInfo] = &[
            $( $(
                SymbolInfo {
                    symbol: Symbol::$name,
                    name: concat!(stringify!($name), "\0"),
                    version: $crate::types::Version::$version,
                },
            )* )*
        ];
    }
}
