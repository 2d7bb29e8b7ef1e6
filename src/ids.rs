//! Human-readable primary keys for tables without a natural auto-increment.
//!
//! A candidate is `prefix + random suffix`; each candidate is probed against
//! the store and returned only when no row already carries it. Both the
//! randomness source and the probe are injected so the loop can be exercised
//! without a database.

use rand::Rng;

/// Probe attempts before giving up on random suffixes.
pub const MAX_ATTEMPTS: usize = 50;

/// Uppercase ASCII letters and digits.
const SUFFIX_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Where an entity's keys live and what they look like.
pub struct IdSpec {
    pub table: &'static str,
    pub column: &'static str,
    pub prefix: &'static str,
    pub suffix_len: usize,
}

pub const USER_ID: IdSpec = IdSpec {
    table: "User",
    column: "user_id",
    prefix: "USER-",
    suffix_len: 4,
};

pub const ARTIST_ID: IdSpec = IdSpec {
    table: "Artist",
    column: "artist_id",
    prefix: "ARTIST-",
    suffix_len: 4,
};

pub const SONG_ID: IdSpec = IdSpec {
    table: "Song",
    column: "song_id",
    prefix: "SONG-",
    suffix_len: 4,
};

pub const PLAYLIST_ID: IdSpec = IdSpec {
    table: "Playlist",
    column: "playlist_id",
    prefix: "PL_",
    suffix_len: 8,
};

/// Plan keys use a small numeric suffix instead of an alphanumeric one, see
/// [`generate_plan_id`]; `suffix_len` is not used for them.
pub const PLAN_ID: IdSpec = IdSpec {
    table: "Plan",
    column: "plan_id",
    prefix: "PLAN-",
    suffix_len: 0,
};

pub fn random_suffix<R: Rng>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| SUFFIX_ALPHABET[rng.random_range(0..SUFFIX_ALPHABET.len())] as char)
        .collect()
}

/// Allocates a fresh key for `spec`. `exists` reports whether a candidate is
/// already taken; a probe error aborts the allocation rather than risking a
/// duplicate key.
///
/// After [`MAX_ATTEMPTS`] collisions the current unix timestamp is used as
/// the suffix. That fallback is not collision-checked; with a 4-character
/// suffix it only triggers once a table holds a large share of the ~1.7M
/// possible keys.
pub fn generate_id<R, F, E>(spec: &IdSpec, rng: &mut R, mut exists: F) -> Result<String, E>
where
    R: Rng,
    F: FnMut(&str) -> Result<bool, E>,
{
    for _ in 0..MAX_ATTEMPTS {
        let candidate = format!("{}{}", spec.prefix, random_suffix(rng, spec.suffix_len));
        if !exists(&candidate)? {
            return Ok(candidate);
        }
    }
    Ok(timestamp_fallback(spec.prefix))
}

/// Plan keys look like `PLAN-<n>` with n in 1..=999.
pub fn generate_plan_id<R, F, E>(rng: &mut R, mut exists: F) -> Result<String, E>
where
    R: Rng,
    F: FnMut(&str) -> Result<bool, E>,
{
    for _ in 0..MAX_ATTEMPTS {
        let candidate = format!("{}{}", PLAN_ID.prefix, rng.random_range(1..=999));
        if !exists(&candidate)? {
            return Ok(candidate);
        }
    }
    Ok(timestamp_fallback(PLAN_ID.prefix))
}

fn timestamp_fallback(prefix: &str) -> String {
    format!("{}{}", prefix, chrono::Utc::now().timestamp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;
    use std::convert::Infallible;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    fn never_exists(_: &str) -> Result<bool, Infallible> {
        Ok(false)
    }

    #[test]
    fn first_attempt_wins_when_store_is_empty() {
        for spec in [&USER_ID, &ARTIST_ID, &SONG_ID, &PLAYLIST_ID] {
            let mut probes = 0;
            let id = generate_id::<_, _, Infallible>(spec, &mut rng(), |_| {
                probes += 1;
                Ok(false)
            })
            .unwrap();
            assert_eq!(probes, 1);
            assert!(id.starts_with(spec.prefix));
            assert_eq!(id.len(), spec.prefix.len() + spec.suffix_len);
        }
    }

    #[test]
    fn suffix_uses_only_uppercase_alphanumerics() {
        let id = generate_id(&USER_ID, &mut rng(), never_exists).unwrap();
        let suffix = &id[USER_ID.prefix.len()..];
        assert!(suffix
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn taken_candidates_are_skipped() {
        // Pre-take the first two candidates the seeded rng would produce.
        let mut preview = rng();
        let taken: HashSet<String> = (0..2)
            .map(|_| format!("{}{}", SONG_ID.prefix, random_suffix(&mut preview, 4)))
            .collect();

        let id = generate_id::<_, _, Infallible>(&SONG_ID, &mut rng(), |candidate| {
            Ok(taken.contains(candidate))
        })
        .unwrap();

        assert!(!taken.contains(&id));
        assert!(id.starts_with(SONG_ID.prefix));
    }

    #[test]
    fn probe_error_aborts_generation() {
        let result = generate_id(&USER_ID, &mut rng(), |_| Err("probe failed"));
        assert_eq!(result.unwrap_err(), "probe failed");
    }

    #[test]
    fn falls_back_to_timestamp_after_exhausting_attempts() {
        let mut probes = 0;
        let id = generate_id::<_, _, Infallible>(&PLAYLIST_ID, &mut rng(), |_| {
            probes += 1;
            Ok(true)
        })
        .unwrap();

        assert_eq!(probes, MAX_ATTEMPTS);
        let suffix = &id[PLAYLIST_ID.prefix.len()..];
        assert!(suffix.parse::<i64>().is_ok());
    }

    #[test]
    fn plan_ids_are_small_numbers() {
        let id = generate_plan_id(&mut rng(), never_exists).unwrap();
        let n: u32 = id.strip_prefix("PLAN-").unwrap().parse().unwrap();
        assert!((1..=999).contains(&n));
    }

    #[test]
    fn plan_id_probe_error_aborts_generation() {
        let result = generate_plan_id(&mut rng(), |_| Err("down"));
        assert_eq!(result.unwrap_err(), "down");
    }
}
