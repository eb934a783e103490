//! # Exchange Snapshot Extraction
//!
//! Turns a spot-clearinghouse state dump into the balance list that feeds
//! [`crate::tree::build_root`]. The dump looks like:
//!
//! ```text
//! {"exchange": {"spot_clearinghouse": {"user_states": [
//!     ["0xabc..", {"b": [[150, {"t": "123", ...}], [0, {...}]], ...}],
//!     ...
//! ]}}}
//! ```
//!
//! Every `b` item whose token id matches yields one entry. Entries are then
//! ranked by balance, largest first, and cut to the top N. Rows that do not
//! have the expected shape are skipped; a missing `user_states` path is an
//! error.

use std::io::Read;

use serde_json::Value;

use crate::artifact::{parse_balance, BalanceEntry};
use crate::config::{DEFAULT_TOKEN_ID, DEFAULT_TOP_N, SNAPSHOT_USER_STATES_PATH};
use crate::error::{MerkleError, Result};

/// Which token to extract and how many holders to keep.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SnapshotFilter {
    pub token_id: u64,
    pub top_n: usize,
}

impl Default for SnapshotFilter {
    fn default() -> Self {
        Self {
            token_id: DEFAULT_TOKEN_ID,
            top_n: DEFAULT_TOP_N,
        }
    }
}

/// Parse a snapshot from a reader and extract the ranked balance list.
pub fn extract_from_reader<R: Read>(
    reader: R,
    filter: &SnapshotFilter,
) -> Result<Vec<BalanceEntry>> {
    let snapshot: Value = serde_json::from_reader(reader)
        .map_err(|e| MerkleError::MalformedSnapshot(e.to_string()))?;
    extract_balances(&snapshot, filter)
}

/// Extract the ranked balance list from an already-parsed snapshot.
pub fn extract_balances(snapshot: &Value, filter: &SnapshotFilter) -> Result<Vec<BalanceEntry>> {
    let user_states = user_states(snapshot)?;

    let mut entries = Vec::new();
    for state in user_states {
        let Some((address, holdings)) = split_user_state(state) else {
            continue;
        };
        for item in holdings {
            let Some(raw) = token_amount(item, filter.token_id) else {
                continue;
            };
            let balance = parse_balance(address, raw)?;
            entries.push(BalanceEntry::new(address, balance));
        }
    }

    let matched = entries.len();
    let ranked = top_holders(entries, filter.top_n);
    tracing::info!(
        token_id = filter.token_id,
        matched,
        kept = ranked.len(),
        "snapshot balances extracted"
    );
    Ok(ranked)
}

/// Sort by balance, largest first, and keep the first `top_n`.
///
/// The sort is stable, so equal balances keep their snapshot order.
pub fn top_holders(mut entries: Vec<BalanceEntry>, top_n: usize) -> Vec<BalanceEntry> {
    entries.sort_by(|a, b| b.balance.cmp(&a.balance));
    entries.truncate(top_n);
    entries
}

fn user_states(snapshot: &Value) -> Result<&Vec<Value>> {
    let mut node = snapshot;
    for key in SNAPSHOT_USER_STATES_PATH {
        node = node
            .get(key)
            .ok_or_else(|| MerkleError::MalformedSnapshot(format!("missing field `{key}`")))?;
    }
    node.as_array().ok_or_else(|| {
        MerkleError::MalformedSnapshot(format!(
            "`{}` is not an array",
            SNAPSHOT_USER_STATES_PATH.join(".")
        ))
    })
}

/// `[address, {"b": [...]}, ...]` -> `(address, b)`.
fn split_user_state(state: &Value) -> Option<(&str, &Vec<Value>)> {
    let row = state.as_array().filter(|row| row.len() >= 2)?;
    let address = row[0].as_str()?;
    let holdings = row[1].get("b")?.as_array()?;
    Some((address, holdings))
}

/// `[token_id, {"t": amount, ...}]` -> `amount`, if the token matches.
fn token_amount(item: &Value, token_id: u64) -> Option<&Value> {
    let pair = item.as_array().filter(|pair| pair.len() >= 2)?;
    if pair[0].as_u64() != Some(token_id) {
        return None;
    }
    pair[1].as_object()?.get("t")
}
