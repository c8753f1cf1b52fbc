/// Types that expose a comparable identifier.
pub trait HasName {
    fn get_name(&self) -> &str;
}

impl<T: HasName + ?Sized> HasName for &T {
    fn get_name(&self) -> &str {
        (*self).get_name()
    }
}

/// Lookup helpers for slices of `T: HasName`.
pub trait FindByName<T> {
    /// First item with the given name.
    fn find_by_name(&self, name: &str) -> Option<&T>;
    /// Index of the first item with the given name.
    fn position_by_name(&self, name: &str) -> Option<usize>;
    /// Names that occur more than once, in order of first repetition.
    fn duplicate_names(&self) -> Vec<String>;
}

impl<T: HasName> FindByName<T> for [T] {
    fn find_by_name(&self, name: &str) -> Option<&T> {
        self.iter().find(|item| item.get_name() == name)
    }

    fn position_by_name(&self, name: &str) -> Option<usize> {
        self.iter().position(|item| item.get_name() == name)
    }

    fn duplicate_names(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        let mut dups: Vec<String> = Vec::new();
        for item in self {
            let name = item.get_name();
            if !seen.insert(name) && !dups.iter().any(|d| d == name) {
                dups.push(name.to_string());
            }
        }
        dups
    }
}
