use std::fmt;

/// Which operation an `IoListener` is waiting on.
///
/// Only `Read` and `Write` are ever pushed into a kernel readiness
/// mechanism directly; `Error` listeners are satisfied out of band
/// whenever a backend observes hang-up or exceptional readiness on a
/// descriptor (see the backends in `crate::backend`).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Direction {
    Read,
    Write,
    Error,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Direction::Read => "read",
            Direction::Write => "write",
            Direction::Error => "error",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::Direction;

    #[test]
    fn display_matches_lowercase_name() {
        assert_eq!(Direction::Read.to_string(), "read");
        assert_eq!(Direction::Write.to_string(), "write");
        assert_eq!(Direction::Error.to_string(), "error");
    }

    #[test]
    fn equality_is_by_variant() {
        assert_eq!(Direction::Read, Direction::Read);
        assert_ne!(Direction::Read, Direction::Write);
    }
}
