use std::fmt;

/// Source location of the expression that ran a check.
///
/// Captured at the call expression by [`call_site!`](crate::call_site), so a
/// failed check reports where it was *called*, not where the check is
/// implemented. All fields are `'static`, capture never allocates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallSite {
    file: &'static str,
    line: u32,
    function: &'static str,
}

impl CallSite {
    /// Build a call site by hand. Prefer the `call_site!()` macro.
    pub const fn new(file: &'static str, line: u32, function: &'static str) -> Self {
        Self {
            file,
            line,
            function,
        }
    }

    /// Source file, as reported by `file!()`.
    pub fn file(&self) -> &'static str {
        self.file
    }

    /// Line number, as reported by `line!()`.
    pub fn line(&self) -> u32 {
        self.line
    }

    /// Path of the enclosing function, e.g. `my_crate::ops::add`.
    ///
    /// Closure frames (`{{closure}}`) are folded into the function that
    /// defines them.
    pub fn function(&self) -> &'static str {
        trim_function_path(self.function)
    }
}

impl fmt::Display for CallSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}) {}:{}", self.function(), self.file, self.line)
    }
}

#[doc(hidden)]
pub const SITE_MARKER: &str = "::__dtguard_site";

fn trim_function_path(raw: &'static str) -> &'static str {
    let mut name = raw.strip_suffix(SITE_MARKER).unwrap_or(raw);
    while let Some(stripped) = name.strip_suffix("::{{closure}}") {
        name = stripped;
    }
    name
}

/// Path of the function this macro is expanded in.
///
/// Works by asking for the type name of a nested fn item, whose path
/// includes every enclosing function. The marker suffix is stripped by
/// [`CallSite::function`].
#[macro_export]
macro_rules! function_name {
    () => {{
        fn __dtguard_site() {}
        fn type_name_of<T>(_: T) -> &'static str {
            ::std::any::type_name::<T>()
        }
        type_name_of(__dtguard_site)
    }};
}

/// Capture the current file, line and enclosing function as a [`CallSite`].
#[macro_export]
macro_rules! call_site {
    () => {
        $crate::site::CallSite::new(file!(), line!(), $crate::function_name!())
    };
}
