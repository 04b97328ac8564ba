/// Set of instruction addresses to pause at. Kept sorted by address.
#[derive(Debug, Default)]
pub struct Breakpoints(Vec<Breakpoint>);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Breakpoint {
    pub address: u16,
    /// Label the breakpoint was set by, if any
    pub label: Option<String>,
}

impl Breakpoints {
    pub fn contains(&self, address: u16) -> bool {
        self.find(address).is_ok()
    }

    /// Returns `false` if a breakpoint already exists at the same address.
    pub fn insert(&mut self, breakpoint: Breakpoint) -> bool {
        match self.find(breakpoint.address) {
            Ok(_) => false,
            Err(index) => {
                self.0.insert(index, breakpoint);
                true
            }
        }
    }

    /// Returns whether a breakpoint was found with given address
    pub fn remove(&mut self, address: u16) -> bool {
        match self.find(address) {
            Ok(index) => {
                self.0.remove(index);
                true
            }
            Err(_) => false,
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &Breakpoint> {
        self.0.iter()
    }

    fn find(&self, address: u16) -> Result<usize, usize> {
        self.0.binary_search_by_key(&address, |breakpoint| breakpoint.address)
    }
}

impl<'a> IntoIterator for &'a Breakpoints {
    type Item = &'a Breakpoint;
    type IntoIter = std::slice::Iter<'a, Breakpoint>;
    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(address: u16) -> Breakpoint {
        Breakpoint {
            address,
            label: None,
        }
    }

    #[test]
    fn stays_sorted_and_unique() {
        let mut breakpoints = Breakpoints::default();
        assert!(breakpoints.insert(at(7)));
        assert!(breakpoints.insert(at(2)));
        assert!(breakpoints.insert(at(4)));
        assert!(!breakpoints.insert(at(4)));
        let addresses: Vec<_> = breakpoints.iter().map(|b| b.address).collect();
        assert_eq!(addresses, [2, 4, 7]);
    }

    #[test]
    fn remove() {
        let mut breakpoints = Breakpoints::default();
        breakpoints.insert(Breakpoint {
            address: 3,
            label: Some("loop".into()),
        });
        assert!(breakpoints.contains(3));
        assert_eq!(
            breakpoints.iter().next().and_then(|b| b.label.as_deref()),
            Some("loop")
        );
        assert!(!breakpoints.remove(4));
        assert!(breakpoints.remove(3));
        assert!(breakpoints.is_empty());
    }
}
