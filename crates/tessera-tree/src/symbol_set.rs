use crate::Symbol;

const BITS_PER_SLOT: usize = u64::BITS as usize;

/// Growable bitset over grammar symbols.
#[derive(Debug, Clone, Default)]
pub struct SymbolSet {
    bits: Vec<u64>,
}

impl PartialEq for SymbolSet {
    fn eq(&self, other: &Self) -> bool {
        self.significant() == other.significant()
    }
}

impl Eq for SymbolSet {}

impl std::hash::Hash for SymbolSet {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.significant().hash(state);
    }
}

impl SymbolSet {
    pub const EMPTY: Self = Self { bits: Vec::new() };

    pub fn with_capacity(symbols: usize) -> Self {
        Self { bits: vec![0; symbols.div_ceil(BITS_PER_SLOT)] }
    }

    fn significant(&self) -> &[u64] {
        let len = self.bits.iter().rposition(|&bits| bits != 0).map_or(0, |last| last + 1);
        &self.bits[..len]
    }

    fn slot_and_mask(symbol: Symbol) -> (usize, u64) {
        let index = symbol.index();
        (index / BITS_PER_SLOT, 1 << (index % BITS_PER_SLOT))
    }

    /// Returns `true` if the symbol was not yet present.
    pub fn insert(&mut self, symbol: Symbol) -> bool {
        debug_assert!(symbol != Symbol::ERROR, "ERROR is never a member of a symbol set");

        let (slot, mask) = Self::slot_and_mask(symbol);
        if slot >= self.bits.len() {
            self.bits.resize(slot + 1, 0);
        }

        let inserted = self.bits[slot] & mask == 0;
        self.bits[slot] |= mask;
        inserted
    }

    pub fn contains(&self, symbol: Symbol) -> bool {
        let (slot, mask) = Self::slot_and_mask(symbol);
        self.bits.get(slot).is_some_and(|bits| bits & mask != 0)
    }

    /// Adds every member of `other`, returning `true` if anything changed.
    pub fn union_with(&mut self, other: &Self) -> bool {
        if other.bits.len() > self.bits.len() {
            self.bits.resize(other.bits.len(), 0);
        }

        let mut changed = false;
        for (slot, &bits) in self.bits.iter_mut().zip(&other.bits) {
            let merged = *slot | bits;
            changed |= merged != *slot;
            *slot = merged;
        }
        changed
    }

    pub fn is_empty(&self) -> bool {
        self.bits.iter().all(|&bits| bits == 0)
    }

    pub fn len(&self) -> usize {
        self.bits.iter().map(|bits| bits.count_ones() as usize).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.bits.iter().enumerate().flat_map(|(slot, &bits)| {
            (0..BITS_PER_SLOT)
                .filter(move |bit| bits & (1 << bit) != 0)
                .map(move |bit| Symbol::new((slot * BITS_PER_SLOT + bit) as u16))
        })
    }
}

impl FromIterator<Symbol> for SymbolSet {
    fn from_iter<I: IntoIterator<Item = Symbol>>(iter: I) -> Self {
        let mut set = Self::EMPTY;
        for symbol in iter {
            set.insert(symbol);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_union() {
        let mut left: SymbolSet = [Symbol::new(1), Symbol::new(70)].into_iter().collect();
        let right: SymbolSet = [Symbol::new(70), Symbol::new(130)].into_iter().collect();

        assert!(!left.insert(Symbol::new(1)));
        assert!(left.union_with(&right));
        assert!(!left.union_with(&right));
        assert_eq!(left.len(), 3);
        assert_eq!(
            left.iter().collect::<Vec<_>>(),
            vec![Symbol::new(1), Symbol::new(70), Symbol::new(130)]
        );
        assert!(!left.contains(Symbol::ERROR));
    }
}
