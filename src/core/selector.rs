use crate::core::geo::haversine;
use crate::core::scoring::compatibility_score;
use crate::models::{MatchTier, Profile};

/// Default cap on candidates considered by the global tier
pub const DEFAULT_GLOBAL_TIER_CAP: usize = 10;

/// The single best candidate selected for a requester.
#[derive(Debug, Clone)]
pub struct SelectedCandidate {
    pub profile: Profile,
    pub score: u8,
    /// Known only for proximity-tier selections
    pub distance_km: Option<f64>,
    pub tier: MatchTier,
}

/// State-free tiered selection over a candidate pool snapshot.
///
/// # Tiers (strict order, first non-empty wins)
/// 1. Proximity - candidates within the requester's search radius
/// 2. Locality - candidates sharing the requester's city
/// 3. Global - the whole pool, score-sorted then capped
///
/// Yielding no candidate is an expected outcome, not an error.
#[derive(Debug, Clone)]
pub struct TieredSelector {
    global_cap: usize,
}

impl TieredSelector {
    pub fn new(global_cap: usize) -> Self {
        // A zero cap would make the global tier select nothing
        Self {
            global_cap: global_cap.max(1),
        }
    }

    /// Select the single best candidate for the requester, or `None` when
    /// every tier comes up empty.
    pub fn select(&self, requester: &Profile, pool: &[Profile]) -> Option<SelectedCandidate> {
        self.proximity_tier(requester, pool)
            .or_else(|| self.locality_tier(requester, pool))
            .or_else(|| self.global_tier(requester, pool))
    }

    /// Tier 1: applicable only when the requester has a coordinate.
    /// Candidates without a coordinate, or whose distance is unknown or
    /// beyond the requester's radius, are skipped. Best score wins, ties
    /// broken by smallest distance.
    fn proximity_tier(&self, requester: &Profile, pool: &[Profile]) -> Option<SelectedCandidate> {
        let (lat, lon) = requester.coordinate()?;
        let radius = requester.search_radius_km();

        let mut in_radius: Vec<(u8, f64, &Profile)> = pool
            .iter()
            .filter_map(|candidate| {
                let (c_lat, c_lon) = candidate.coordinate()?;
                let distance = haversine(lat, lon, c_lat, c_lon)?;
                if distance <= radius {
                    let score = compatibility_score(&requester.answers, &candidate.answers);
                    Some((score, distance, candidate))
                } else {
                    None
                }
            })
            .collect();

        in_radius.sort_by(|(score_a, dist_a, _), (score_b, dist_b, _)| {
            score_b.cmp(score_a).then_with(|| {
                dist_a
                    .partial_cmp(dist_b)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
        });

        in_radius
            .first()
            .map(|(score, distance, profile)| SelectedCandidate {
                profile: (*profile).clone(),
                score: *score,
                distance_km: Some(*distance),
                tier: MatchTier::Proximity,
            })
    }

    /// Tier 2: candidates sharing the requester's city, case-insensitive.
    /// City names carry accents (Mâcon, Évian), so the comparison must be
    /// Unicode-aware, not ASCII-only. Ties keep pool order (stable sort),
    /// so the result is deterministic for a given pool snapshot. Distance
    /// is reported unknown.
    fn locality_tier(&self, requester: &Profile, pool: &[Profile]) -> Option<SelectedCandidate> {
        let city = requester.city.as_deref()?.to_lowercase();

        let mut same_city: Vec<(u8, &Profile)> = pool
            .iter()
            .filter(|candidate| {
                candidate
                    .city
                    .as_deref()
                    .is_some_and(|c| c.to_lowercase() == city)
            })
            .map(|candidate| {
                (
                    compatibility_score(&requester.answers, &candidate.answers),
                    candidate,
                )
            })
            .collect();

        same_city.sort_by(|(score_a, _), (score_b, _)| score_b.cmp(score_a));

        same_city.first().map(|(score, profile)| SelectedCandidate {
            profile: (*profile).clone(),
            score: *score,
            distance_km: None,
            tier: MatchTier::Locality,
        })
    }

    /// Tier 3: the whole pool, sorted by score before truncating to the
    /// cap. Truncating first would discard high scorers from large pools.
    fn global_tier(&self, requester: &Profile, pool: &[Profile]) -> Option<SelectedCandidate> {
        let mut scored: Vec<(u8, &Profile)> = pool
            .iter()
            .map(|candidate| {
                (
                    compatibility_score(&requester.answers, &candidate.answers),
                    candidate,
                )
            })
            .collect();

        scored.sort_by(|(score_a, _), (score_b, _)| score_b.cmp(score_a));
        scored.truncate(self.global_cap);

        scored.first().map(|(score, profile)| SelectedCandidate {
            profile: (*profile).clone(),
            score: *score,
            distance_km: None,
            tier: MatchTier::Global,
        })
    }
}

impl Default for TieredSelector {
    fn default() -> Self {
        Self::new(DEFAULT_GLOBAL_TIER_CAP)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CompatibilityAnswers, Gender};
    use uuid::Uuid;

    fn profile(lat: Option<f64>, lon: Option<f64>, city: Option<&str>) -> Profile {
        Profile {
            id: Uuid::new_v4(),
            first_name: "Candidate".to_string(),
            gender: Gender::Female,
            looking_for: Gender::Male,
            lat,
            lon,
            city: city.map(str::to_string),
            distance_max: None,
            age: 27,
            age_min: None,
            age_max: None,
            answers: CompatibilityAnswers::all(true),
            in_conversation: false,
            is_blocked: false,
            credits: 7,
            is_subscribed: false,
        }
    }

    fn requester() -> Profile {
        // Paris, 50km default radius
        let mut p = profile(Some(48.8566), Some(2.3522), Some("Paris"));
        p.gender = Gender::Male;
        p.looking_for = Gender::Female;
        p
    }

    #[test]
    fn test_proximity_tier_wins_when_in_radius() {
        let selector = TieredSelector::default();
        let requester = requester();

        let pool = vec![
            profile(Some(48.85), Some(2.35), Some("Paris")), // <1km away
            profile(None, None, Some("Paris")),              // no coordinate
        ];

        let selected = selector.select(&requester, &pool).unwrap();
        assert_eq!(selected.tier, MatchTier::Proximity);
        assert_eq!(selected.score, 100);
        assert!(selected.distance_km.unwrap() < 1.0);
    }

    #[test]
    fn test_proximity_ties_broken_by_distance() {
        let selector = TieredSelector::default();
        let requester = requester();

        let far = profile(Some(48.95), Some(2.35), None); // ~10km
        let near = profile(Some(48.86), Some(2.3522), None); // <1km
        let pool = vec![far, near.clone()];

        let selected = selector.select(&requester, &pool).unwrap();
        assert_eq!(selected.profile.id, near.id);
    }

    #[test]
    fn test_proximity_prefers_score_over_distance() {
        let selector = TieredSelector::default();
        let requester = requester();

        let mut near_low_score = profile(Some(48.86), Some(2.3522), None);
        near_low_score.answers = CompatibilityAnswers::all(false);
        let far_high_score = profile(Some(48.95), Some(2.35), None);
        let pool = vec![near_low_score, far_high_score.clone()];

        let selected = selector.select(&requester, &pool).unwrap();
        assert_eq!(selected.profile.id, far_high_score.id);
        assert_eq!(selected.score, 100);
    }

    #[test]
    fn test_no_coordinate_skips_proximity_tier() {
        let selector = TieredSelector::default();
        let mut requester = requester();
        requester.lat = None;
        requester.lon = None;

        // An in-radius candidate exists, but tier 1 must never run
        let pool = vec![profile(Some(48.85), Some(2.35), Some("Paris"))];

        let selected = selector.select(&requester, &pool).unwrap();
        assert_eq!(selected.tier, MatchTier::Locality);
        assert_eq!(selected.distance_km, None);
    }

    #[test]
    fn test_locality_fallback_when_out_of_radius() {
        let selector = TieredSelector::default();
        let requester = requester();

        // Lyon is ~390km from Paris, outside the 50km radius, but the
        // candidate claims Paris as their city
        let pool = vec![profile(Some(45.7640), Some(4.8357), Some("paris"))];

        let selected = selector.select(&requester, &pool).unwrap();
        assert_eq!(selected.tier, MatchTier::Locality);
    }

    #[test]
    fn test_locality_is_case_insensitive() {
        let selector = TieredSelector::default();
        let mut requester = requester();
        requester.lat = None;
        requester.lon = None;
        requester.city = Some("LYON".to_string());

        let pool = vec![profile(None, None, Some("lyon"))];

        let selected = selector.select(&requester, &pool).unwrap();
        assert_eq!(selected.tier, MatchTier::Locality);
    }

    #[test]
    fn test_locality_handles_accented_city_names() {
        let selector = TieredSelector::default();
        let mut requester = requester();
        requester.lat = None;
        requester.lon = None;
        requester.city = Some("Évian".to_string());

        let pool = vec![profile(None, None, Some("évian"))];

        let selected = selector.select(&requester, &pool).unwrap();
        assert_eq!(selected.tier, MatchTier::Locality);
    }

    #[test]
    fn test_locality_ties_keep_pool_order() {
        let selector = TieredSelector::default();
        let mut requester = requester();
        requester.lat = None;
        requester.lon = None;

        let first = profile(None, None, Some("Paris"));
        let second = profile(None, None, Some("Paris"));
        let pool = vec![first.clone(), second];

        let selected = selector.select(&requester, &pool).unwrap();
        assert_eq!(selected.profile.id, first.id);
    }

    #[test]
    fn test_global_fallback() {
        let selector = TieredSelector::default();
        let mut requester = requester();
        requester.lat = None;
        requester.lon = None;
        requester.city = None;

        let pool = vec![profile(None, None, Some("Marseille"))];

        let selected = selector.select(&requester, &pool).unwrap();
        assert_eq!(selected.tier, MatchTier::Global);
        assert_eq!(selected.distance_km, None);
    }

    #[test]
    fn test_global_sorts_before_truncating() {
        let selector = TieredSelector::new(2);
        let mut requester = requester();
        requester.lat = None;
        requester.lon = None;
        requester.city = None;

        // Best scorer sits past the cap in pool order; sort-then-truncate
        // must still find it
        let mut pool: Vec<Profile> = (0..5)
            .map(|_| {
                let mut p = profile(None, None, None);
                p.answers = CompatibilityAnswers::all(false);
                p
            })
            .collect();
        let best = profile(None, None, None);
        pool.push(best.clone());

        let selected = selector.select(&requester, &pool).unwrap();
        assert_eq!(selected.profile.id, best.id);
        assert_eq!(selected.score, 100);
    }

    #[test]
    fn test_empty_pool_is_no_match() {
        let selector = TieredSelector::default();
        assert!(selector.select(&requester(), &[]).is_none());
    }
}
