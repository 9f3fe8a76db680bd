//! Macros to reduce boilerplate when building parameter sets
//!
//! ```rust
//! use arcgis_export::params;
//!
//! let params = params! {
//!     "LAYERS" => "show:0,2",
//!     "DPI" => 96,
//!     "TRANSPARENT" => false,
//! };
//! assert_eq!(params.len(), 3);
//! ```

/// Builds a [`ParameterSet`](crate::tiles::params::ParameterSet) from
/// `key => value` pairs. Values take anything convertible into a
/// [`ParamValue`](crate::tiles::params::ParamValue).
#[macro_export]
macro_rules! params {
    () => {
        $crate::tiles::params::ParameterSet::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut params = $crate::tiles::params::ParameterSet::new();
        $(
            params.insert($key, $value);
        )+
        params
    }};
}
