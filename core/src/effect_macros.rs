//! Declarative macros for ergonomic update construction
//!
//! These macros reduce boilerplate when returning an [`Update`](crate::reducer::Update)
//! from a reducer.

/// Create an [`Update`](crate::reducer::Update) from a state and an ordered list of effects
///
/// # Example
///
/// ```
/// use mvu_core::update;
///
/// let no_effects: mvu_core::reducer::Update<u32, &str> = update!(1_u32);
/// assert!(no_effects.effects.is_empty());
///
/// let with_effects = update!(2_u32, "persist", "sync");
/// assert_eq!(with_effects.effects.as_slice(), ["persist", "sync"]);
/// ```
#[macro_export]
macro_rules! update {
    ($state:expr $(,)?) => {
        $crate::reducer::Update::new($state)
    };
    ($state:expr, $($effect:expr),+ $(,)?) => {
        $crate::reducer::Update {
            state: $state,
            effects: $crate::smallvec![$($effect),+],
        }
    };
}
