/// Incorrect use of a scoped value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MisuseError {
    /// The accessor ran with no enclosing provider mount.
    #[error("`{name}` was accessed outside of its provider")]
    OutsideProvider { name: &'static str },

    /// A binding exists for the key but holds another type.
    #[error("`{name}` is bound to a value of a different type")]
    TypeMismatch { name: &'static str },
}
