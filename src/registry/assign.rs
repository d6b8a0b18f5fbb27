//! Deterministic variable-ID assignment.
//!
//! IDs are derived from names with a salted 8-bit FNV-1a variant so
//! that the same sorted name list always yields the same mapping,
//! regardless of declaration order. The hash constants were chosen
//! only for stability; the contract is that host and firmware builds
//! reproduce the assignment bit-for-bit.

use super::RegistryError;

/// Lowest assignable variable ID. `0x00` is reserved forever.
pub const ID_MIN: u8 = 0x01;

/// Highest assignable variable ID. `[0xF0, 0xFF]` is reserved forever.
pub const ID_MAX: u8 = 0xEF;

/// Salted 8-bit FNV-1a over the UTF-8 bytes of `name`.
#[must_use]
pub fn fnv1a8(name: &str, salt: u8) -> u8 {
    let mut h = 0xCBu8 ^ salt;
    for b in name.bytes() {
        h ^= b;
        h = h.wrapping_mul(0x1B);
    }
    h
}

/// Assign a stable ID to every name.
///
/// Names are sorted lexicographically first; each then takes the first
/// salt in `0..=255` whose hash lands on a free ID in
/// `[ID_MIN, ID_MAX]`, falling back to a linear scan of the range.
/// Returns pairs in the sorted name order.
pub fn assign_ids<S: AsRef<str>>(names: &[S]) -> Result<Vec<(String, u8)>, RegistryError> {
    let mut sorted: Vec<&str> = names.iter().map(AsRef::as_ref).collect();
    sorted.sort_unstable();

    let mut used = [false; 256];
    let mut assigned = Vec::with_capacity(sorted.len());
    for name in sorted {
        let id = pick_id(name, &used).ok_or(RegistryError::IdSpaceExhausted {
            capacity: (ID_MAX - ID_MIN + 1) as usize,
        })?;
        used[id as usize] = true;
        assigned.push((name.to_owned(), id));
    }
    Ok(assigned)
}

fn pick_id(name: &str, used: &[bool; 256]) -> Option<u8> {
    for salt in 0..=255u8 {
        let hash = fnv1a8(name, salt);
        if (ID_MIN..=ID_MAX).contains(&hash) && !used[hash as usize] {
            return Some(hash);
        }
    }
    (ID_MIN..=ID_MAX).find(|id| !used[*id as usize])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_matches_reference() {
        // h starts at 0xCB ^ salt, then xor/multiply per byte.
        let mut h = 0xCBu8;
        for b in "motor_left".bytes() {
            h ^= b;
            h = h.wrapping_mul(0x1B);
        }
        assert_eq!(fnv1a8("motor_left", 0), h);
        assert_ne!(fnv1a8("motor_left", 0), fnv1a8("motor_left", 1));
    }

    #[test]
    fn test_assignment_is_order_independent() {
        let a = assign_ids(&["beta", "alpha", "gamma"]).unwrap();
        let b = assign_ids(&["gamma", "beta", "alpha"]).unwrap();
        assert_eq!(a, b);
        assert_eq!(a[0].0, "alpha");
    }

    #[test]
    fn test_ids_stay_in_range_and_unique() {
        let names: Vec<String> = (0..200).map(|i| format!("var_{i:03}")).collect();
        let assigned = assign_ids(&names).unwrap();
        let mut seen = [false; 256];
        for (name, id) in &assigned {
            assert!((ID_MIN..=ID_MAX).contains(id), "{name} got {id:#04x}");
            assert!(!seen[*id as usize], "collision on {id:#04x}");
            seen[*id as usize] = true;
        }
    }

    #[test]
    fn test_full_capacity_then_exhausted() {
        let names: Vec<String> = (0..239).map(|i| format!("v{i}")).collect();
        assert_eq!(assign_ids(&names).unwrap().len(), 239);

        let names: Vec<String> = (0..240).map(|i| format!("v{i}")).collect();
        assert!(matches!(
            assign_ids(&names),
            Err(RegistryError::IdSpaceExhausted { capacity: 239 })
        ));
    }
}
