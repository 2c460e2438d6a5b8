//! Enchantment identifiers and offer values.
//!
//! Every identifier that enters the tracker (from a command argument, a live
//! villager offer or a stored row) goes through [`normalize_enchant_id`] so the
//! store never holds two spellings of the same enchantment.
//!
//! Offers carry a price, but two offers are the *same offer* when their
//! [`EnchantmentKey`] (id + level) match. The price is metadata and is never
//! part of equality; collections of offers are keyed by [`EnchantmentInfo::identity`].

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Namespace every stored identifier carries exactly once.
pub const CANONICAL_NAMESPACE: &str = "minecraft:";

/// Prefix used by translation/lookup keys (`enchantments.fortune`).
pub const LOOKUP_KEY_PREFIX: &str = "enchantments.";

/// Canonicalize a raw enchantment identifier.
///
/// Trims whitespace, lowercases, strips any run of namespace and lookup-key
/// prefixes in whatever order they appear, then re-adds a single namespace.
/// `normalize_enchant_id(normalize_enchant_id(x)) == normalize_enchant_id(x)`.
pub fn normalize_enchant_id(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    let mut rest = lowered.as_str();
    loop {
        if let Some(stripped) = rest.strip_prefix(LOOKUP_KEY_PREFIX) {
            rest = stripped.trim_start();
        } else if let Some(stripped) = rest.strip_prefix(CANONICAL_NAMESPACE) {
            rest = stripped.trim_start();
        } else {
            break;
        }
    }
    format!("{}{}", CANONICAL_NAMESPACE, rest)
}

/// Normalized enchantment identifier, e.g. `minecraft:fortune`.
///
/// Construction always normalizes, including when decoding stored records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct EnchantmentId(String);

impl EnchantmentId {
    pub fn new(raw: &str) -> Self {
        Self(normalize_enchant_id(raw))
    }

    /// Optional passthrough: `None` stays `None` instead of becoming an error.
    pub fn from_optional(raw: Option<&str>) -> Option<Self> {
        raw.map(Self::new)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Identifier without the namespace (`fortune`).
    pub fn path(&self) -> &str {
        self.0
            .strip_prefix(CANONICAL_NAMESPACE)
            .unwrap_or(self.0.as_str())
    }
}

impl From<String> for EnchantmentId {
    fn from(raw: String) -> Self {
        Self::new(&raw)
    }
}

impl From<&str> for EnchantmentId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<EnchantmentId> for String {
    fn from(id: EnchantmentId) -> Self {
        id.0
    }
}

impl fmt::Display for EnchantmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of an offer: which enchantment, at which level.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnchantmentKey {
    pub id: EnchantmentId,
    pub level: u32,
}

impl EnchantmentKey {
    pub fn new(id: impl Into<EnchantmentId>, level: u32) -> Self {
        Self {
            id: id.into(),
            level,
        }
    }
}

impl fmt::Display for EnchantmentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.id, self.level)
    }
}

/// An enchantment offer: identity key plus an optional price in emeralds.
///
/// Deliberately not `PartialEq`/`Hash`: compare offers through
/// [`EnchantmentInfo::identity`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnchantmentInfo {
    pub key: EnchantmentKey,
    #[serde(default)]
    pub price: Option<u32>,
}

impl EnchantmentInfo {
    pub fn new(id: impl Into<EnchantmentId>, level: u32, price: Option<u32>) -> Self {
        Self {
            key: EnchantmentKey::new(id, level),
            price,
        }
    }

    /// Catalog entries have no price.
    pub fn unpriced(id: impl Into<EnchantmentId>, level: u32) -> Self {
        Self::new(id, level, None)
    }

    pub fn id(&self) -> &EnchantmentId {
        &self.key.id
    }

    pub fn level(&self) -> u32 {
        self.key.level
    }

    /// The identity this offer is compared and hashed by.
    pub fn identity(&self) -> &EnchantmentKey {
        &self.key
    }

    /// True when this offer satisfies `target`: same id, level at least as high.
    pub fn can_replace(&self, target: &EnchantmentKey) -> bool {
        self.key.id == target.id && self.key.level >= target.level
    }
}

impl fmt::Display for EnchantmentInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.price {
            Some(price) => write!(f, "{} ({} emeralds)", self.key, price),
            None => write!(f, "{}", self.key),
        }
    }
}

/// Ordered collection of offers, de-duplicated by identity.
///
/// The first offer seen for an identity wins; later duplicates (even at a
/// different price) are dropped. Insertion order is preserved.
#[derive(Debug, Clone, Default)]
pub struct OfferSet {
    offers: Vec<EnchantmentInfo>,
    seen: HashSet<EnchantmentKey>,
}

impl OfferSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when an offer with the same identity was already present.
    pub fn insert(&mut self, offer: EnchantmentInfo) -> bool {
        if !self.seen.insert(offer.key.clone()) {
            return false;
        }
        self.offers.push(offer);
        true
    }

    pub fn extend<I: IntoIterator<Item = EnchantmentInfo>>(&mut self, offers: I) -> usize {
        let mut added = 0;
        for offer in offers {
            if self.insert(offer) {
                added += 1;
            }
        }
        added
    }

    pub fn iter(&self) -> impl Iterator<Item = &EnchantmentInfo> {
        self.offers.iter()
    }

    pub fn len(&self) -> usize {
        self.offers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offers.is_empty()
    }

    /// Offers sorted by identity, for stable rendering.
    pub fn into_sorted_vec(self) -> Vec<EnchantmentInfo> {
        let mut offers = self.offers;
        offers.sort_by(|a, b| a.key.cmp(&b.key));
        offers
    }
}

impl FromIterator<EnchantmentInfo> for OfferSet {
    fn from_iter<I: IntoIterator<Item = EnchantmentInfo>>(iter: I) -> Self {
        let mut set = OfferSet::new();
        set.extend(iter);
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_bare_and_prefixed_ids() {
        assert_eq!(normalize_enchant_id("fortune"), "minecraft:fortune");
        assert_eq!(normalize_enchant_id("minecraft:fortune"), "minecraft:fortune");
        assert_eq!(normalize_enchant_id("  Fortune \n"), "minecraft:fortune");
        assert_eq!(
            normalize_enchant_id("enchantments.silk_touch"),
            "minecraft:silk_touch"
        );
    }

    #[test]
    fn strips_repeated_and_mixed_case_prefixes() {
        assert_eq!(
            normalize_enchant_id("minecraft:minecraft:minecraft:mending"),
            "minecraft:mending"
        );
        assert_eq!(normalize_enchant_id("MINECRAFT:Mending"), "minecraft:mending");
        assert_eq!(
            normalize_enchant_id("Enchantments.Minecraft:minecraft:Looting"),
            "minecraft:looting"
        );
        assert_eq!(
            normalize_enchant_id("minecraft:enchantments.unbreaking"),
            "minecraft:unbreaking"
        );
    }

    #[test]
    fn normalization_is_idempotent() {
        let inputs = [
            "",
            "fortune",
            "MINECRAFT:MINECRAFT:Sharpness",
            "enchantments.minecraft:Efficiency",
            " minecraft: protection ",
            "custom:thing",
        ];
        for raw in inputs {
            let once = normalize_enchant_id(raw);
            let twice = normalize_enchant_id(&once);
            assert_eq!(once, twice, "input {:?}", raw);
        }
    }

    #[test]
    fn optional_passthrough_keeps_none() {
        assert_eq!(EnchantmentId::from_optional(None), None);
        assert_eq!(
            EnchantmentId::from_optional(Some("Fortune")).map(String::from),
            Some("minecraft:fortune".to_string())
        );
    }

    #[test]
    fn decoding_normalizes_stored_ids() {
        let id: EnchantmentId = serde_json::from_str("\"minecraft:minecraft:Fortune\"").unwrap();
        assert_eq!(id.as_str(), "minecraft:fortune");
        assert_eq!(id.path(), "fortune");
    }

    #[test]
    fn price_is_not_identity() {
        let a = EnchantmentInfo::new("fortune", 3, Some(10));
        let b = EnchantmentInfo::new("minecraft:fortune", 3, Some(42));
        let c = EnchantmentInfo::new("fortune", 2, Some(10));
        assert_eq!(a.identity(), b.identity());
        assert_ne!(a.identity(), c.identity());
    }

    #[test]
    fn can_replace_requires_same_id_and_higher_or_equal_level() {
        let offer = EnchantmentInfo::new("fortune", 3, Some(20));
        assert!(offer.can_replace(&EnchantmentKey::new("fortune", 3)));
        assert!(offer.can_replace(&EnchantmentKey::new("fortune", 1)));
        assert!(!offer.can_replace(&EnchantmentKey::new("fortune", 4)));
        assert!(!offer.can_replace(&EnchantmentKey::new("looting", 1)));
    }

    #[test]
    fn offer_set_keeps_first_price_seen() {
        let mut set = OfferSet::new();
        assert!(set.insert(EnchantmentInfo::new("fortune", 3, Some(12))));
        assert!(!set.insert(EnchantmentInfo::new("fortune", 3, Some(30))));
        assert!(set.insert(EnchantmentInfo::new("fortune", 2, Some(8))));
        assert_eq!(set.len(), 2);
        let key = EnchantmentKey::new("fortune", 3);
        let kept = set.iter().find(|offer| offer.identity() == &key).unwrap();
        assert_eq!(kept.price, Some(12));
    }
}
