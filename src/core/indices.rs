use hashbrown::HashMap;

use crate::types::QsoId;

/// Key to QSO ids, in log order.
pub type VecIndex<K> = HashMap<K, Vec<QsoId>>;

/// Key to positions in a QSO slice, ascending.
pub type PosIndex<K> = HashMap<K, Vec<usize>>;

/// Index key for a callsign.
pub fn call_key(call: &str) -> String {
    call.trim().to_ascii_uppercase()
}
