use tracing::debug;

use super::{ResolvedSymbol, SymbolCatalog};
use crate::error::{Error, Result};

impl SymbolCatalog {
    /// Follow the alias table from `symbol` to a name with no alias entry.
    ///
    /// A trailing `*` on `symbol` is stripped and forces the pointer flag.
    /// The returned flag is the OR of every hop. Chains longer than the
    /// number of known aliases can only be cycles and fail with
    /// [`Error::CyclicAlias`].
    pub fn resolve_root(
        &self,
        symbol: &str,
    ) -> Result<ResolvedSymbol> {
        let trimmed = symbol.trim();
        let stripped = trimmed.trim_end_matches(|c: char| c == '*' || c.is_whitespace());
        let mut is_pointer = stripped.len() != trimmed.len();

        let max_hops = self.alias_hop_bound();
        let mut current = stripped;
        let mut hops = 0usize;
        while let Some(alias) = self.alias(current) {
            if hops == max_hops {
                debug!("[resolve] '{symbol}' exceeded {max_hops} alias hops");
                return Err(Error::CyclicAlias {
                    symbol: stripped.to_owned(),
                    hops,
                });
            }
            is_pointer |= alias.is_pointer;
            current = alias.target.as_str();
            hops += 1;
        }

        Ok(ResolvedSymbol {
            root: current.to_owned(),
            is_pointer,
        })
    }

    fn alias_hop_bound(&self) -> usize {
        let automatic = self.alias_count() + 1;
        match self.max_alias_hops {
            Some(cap) => cap.min(automatic),
            None => automatic,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/src/catalog/resolve_tests.rs"]
mod tests;
