//! Complex-number shorthand and output macros for driver programs.

#[doc(hidden)]
pub use ndarray_npy;
#[doc(hidden)]
pub use num_complex;

/// Shorthand for constructing a [`num_complex::Complex64`].
///
/// ```
/// use floquet_edge::c;
/// let a = c!(1.0, 2.0);
/// let b = c!(i 3.0);
/// let z = c!(e 0.5);
/// assert_eq!(a.im, 2.0);
/// assert_eq!(b.re, 0.0);
/// assert!((z.norm() - 1.0).abs() < 1e-15);
/// ```
#[macro_export]
macro_rules! c {
    ( i $im:expr ) => {
        $crate::utils::num_complex::Complex64::new(0.0, $im)
    };
    ( e $ph:expr ) => {
        $crate::utils::num_complex::Complex64::cis($ph)
    };
    ( $re:expr, $im:expr ) => {
        $crate::utils::num_complex::Complex64::new($re, $im)
    };
    ( $re:expr ) => {
        $crate::utils::num_complex::Complex64::new($re, 0.0)
    };
}

/// Create a directory and all its parents if it doesn't already exist.
///
/// Must be called from a function returning a `Result` whose error type can be
/// built from [`std::io::Error`].
#[macro_export]
macro_rules! mkdir {
    ( $dir:expr ) => {
        {
            let dir = &$dir;
            if !dir.is_dir() {
                std::fs::create_dir_all(dir)?;
            }
        }
    };
}

/// Write a series of named arrays to a `.npz` archive.
///
/// ```ignore
/// write_npz!(
///     outdir.join("data.npz"),
///     arrays: {
///         "time" => &time,
///         "density" => &density,
///     }
/// );
/// ```
///
/// Must be called from a function returning a `Result` whose error type can be
/// built from both [`std::io::Error`] and
/// [`ndarray_npy::WriteNpzError`].
#[macro_export]
macro_rules! write_npz {
    (
        $outfile:expr,
        arrays: { $( $key:literal => $arr:expr ),* $(,)? }
    ) => {
        {
            let mut data
                = $crate::utils::ndarray_npy::NpzWriter::new(
                    std::fs::File::create($outfile)?);
            $(
                data.add_array($key, $arr)?;
            )*
            data.finish()?;
        }
    };
}

/// Call `print!` and immediately flush.
#[macro_export]
macro_rules! print_flush {
    ( $fmt:literal $(, $val:expr )* $(,)? ) => {
        print!($fmt $(, $val )*);
        std::io::Write::flush(&mut std::io::stdout()).ok();
    }
}

/// Call `println!` and immediately flush.
#[macro_export]
macro_rules! println_flush {
    ( $fmt:literal $(, $val:expr )* $(,)? ) => {
        println!($fmt $(, $val )*);
        std::io::Write::flush(&mut std::io::stdout()).ok();
    }
}
