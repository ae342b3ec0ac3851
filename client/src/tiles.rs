//! Coordinate-keyed cache of rendered parcel nodes.
//!
//! The cache never touches the DOM directly: node creation, in-place updates
//! and removal go through a [`TileSurface`], so reconciliation can run against
//! a recording surface in tests and against real elements in the browser.

use std::collections::{HashMap, HashSet};
use std::fmt;

use kasland_shared::{GridPos, Parcel};

use crate::config::IMAGE_BASE;

const PLACEHOLDER_SPRITE: &str = "parcelle";
const SALE_LABEL: &str = "FOR SALE";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidParcel {
    #[error("parcel at {0} has no id")]
    MissingId(GridPos),
    #[error("parcel at {pos} lies outside a {map_size}x{map_size} map")]
    OutOfBounds { pos: GridPos, map_size: u32 },
}

/// Only parcels with an id and in-bounds coordinates are ever rendered.
pub fn validate(parcel: &Parcel, map_size: u32) -> Result<GridPos, InvalidParcel> {
    let pos = parcel.pos();
    if !parcel.has_id() {
        return Err(InvalidParcel::MissingId(pos));
    }
    if !pos.in_bounds(map_size) {
        return Err(InvalidParcel::OutOfBounds { pos, map_size });
    }
    Ok(pos)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sprite {
    /// `{type}_{variant}` building artwork, both lowercased.
    Building { kind: String, variant: String },
    Placeholder,
}

impl Sprite {
    pub fn src(&self) -> String {
        match self {
            Sprite::Building { kind, variant } => format!("{IMAGE_BASE}/{kind}_{variant}.webp"),
            Sprite::Placeholder => format!("{IMAGE_BASE}/{PLACEHOLDER_SPRITE}.webp"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RarityBadge {
    /// Extra class on the badge, e.g. `legendary`.
    pub class: String,
    /// Single uppercase letter shown inside the badge.
    pub letter: String,
}

impl RarityBadge {
    fn from_rarity(rarity: &str) -> Option<Self> {
        let first = rarity.chars().next()?;
        Some(Self {
            class: rarity.to_lowercase(),
            letter: first.to_uppercase().collect(),
        })
    }
}

/// Everything a surface needs to paint one tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileVisual {
    pub class_name: String,
    pub sprite: Sprite,
    pub rarity: Option<RarityBadge>,
    pub for_sale: bool,
    pub user_owned: bool,
}

impl TileVisual {
    /// `account` is the connected wallet, if any; ownership highlight depends on it.
    pub fn for_parcel(parcel: &Parcel, account: Option<&str>) -> Self {
        let type_class = parcel
            .building_type
            .as_deref()
            .filter(|kind| !kind.is_empty())
            .map(str::to_lowercase)
            .unwrap_or_else(|| "parcel".to_string());

        let (sprite, rarity) = match (parcel.is_owned(), parcel.building()) {
            (true, Some((kind, variant))) => (
                Sprite::Building {
                    kind: kind.to_lowercase(),
                    variant: variant.to_lowercase(),
                },
                parcel.rarity.as_deref().and_then(RarityBadge::from_rarity),
            ),
            (true, None) => {
                log::warn!(
                    "parcel {} at {} is owned but has no building type or variant",
                    parcel.id.unwrap_or_default(),
                    parcel.pos()
                );
                (Sprite::Placeholder, None)
            }
            (false, _) => (Sprite::Placeholder, None),
        };

        let user_owned = match account {
            Some(account) if !account.is_empty() => parcel.is_owned_by(account),
            _ => false,
        };

        Self {
            class_name: format!("tile {type_class}"),
            sprite,
            rarity,
            for_sale: parcel.is_for_sale,
            user_owned,
        }
    }

    pub fn sale_label(&self) -> Option<&'static str> {
        self.for_sale.then_some(SALE_LABEL)
    }

    /// Full class list including state modifiers.
    pub fn class_list(&self) -> String {
        let mut classes = self.class_name.clone();
        if self.for_sale {
            classes.push_str(" for-sale");
        }
        if self.user_owned {
            classes.push_str(" user-owned");
        }
        classes
    }
}

/// Rendering target for tiles. `Node` is an opaque handle owned by the cache.
pub trait TileSurface {
    type Node;
    type Error: fmt::Display;

    fn create(&mut self, pos: GridPos, visual: &TileVisual) -> Result<Self::Node, Self::Error>;
    fn update(&mut self, node: &mut Self::Node, visual: &TileVisual) -> Result<(), Self::Error>;
    fn remove(&mut self, node: Self::Node);
}

struct CachedTile<N> {
    node: N,
    visual: TileVisual,
}

/// Counts from one reconcile pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub evicted: usize,
    pub dropped: usize,
    pub failed: usize,
}

pub struct RenderCache<S: TileSurface> {
    surface: S,
    nodes: HashMap<GridPos, CachedTile<S::Node>>,
}

impl<S: TileSurface> RenderCache<S> {
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            nodes: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn contains(&self, pos: GridPos) -> bool {
        self.nodes.contains_key(&pos)
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn keys(&self) -> impl Iterator<Item = GridPos> + '_ {
        self.nodes.keys().copied()
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn visual(&self, pos: GridPos) -> Option<&TileVisual> {
        self.nodes.get(&pos).map(|cached| &cached.visual)
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Bring the cached nodes in line with `parcels`.
    ///
    /// Afterwards the cache holds exactly one node per valid parcel
    /// coordinate, barring surface failures, which are logged and counted.
    pub fn reconcile<'a>(
        &mut self,
        parcels: impl IntoIterator<Item = &'a Parcel>,
        map_size: u32,
        account: Option<&str>,
    ) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        let mut live: HashSet<GridPos> = HashSet::with_capacity(self.nodes.len());

        for parcel in parcels {
            let pos = match validate(parcel, map_size) {
                Ok(pos) => pos,
                Err(e) => {
                    log::warn!("skipping parcel: {e}");
                    report.dropped += 1;
                    continue;
                }
            };
            live.insert(pos);
            let visual = TileVisual::for_parcel(parcel, account);

            match self.nodes.get_mut(&pos) {
                Some(cached) if cached.visual == visual => report.unchanged += 1,
                Some(cached) => match self.surface.update(&mut cached.node, &visual) {
                    Ok(()) => {
                        cached.visual = visual;
                        report.updated += 1;
                    }
                    Err(e) => {
                        log::error!("failed to update tile {pos}: {e}");
                        report.failed += 1;
                    }
                },
                None => match self.surface.create(pos, &visual) {
                    Ok(node) => {
                        self.nodes.insert(pos, CachedTile { node, visual });
                        report.created += 1;
                    }
                    Err(e) => {
                        log::error!("failed to create tile {pos}: {e}");
                        report.failed += 1;
                    }
                },
            }
        }

        // Collect first: the map cannot be mutated while it is iterated.
        let stale: Vec<GridPos> = self
            .nodes
            .keys()
            .filter(|pos| !live.contains(pos))
            .copied()
            .collect();
        for pos in stale {
            if let Some(cached) = self.nodes.remove(&pos) {
                self.surface.remove(cached.node);
                report.evicted += 1;
            }
        }

        report
    }

    /// Remove every node from the surface and forget it.
    pub fn clear(&mut self) {
        for (_, cached) in self.nodes.drain() {
            self.surface.remove(cached.node);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone, PartialEq)]
    enum Op {
        Create(GridPos),
        Update(GridPos),
        Remove(GridPos),
    }

    /// Records every surface call; nodes are just their coordinates.
    #[derive(Default)]
    struct RecordingSurface {
        ops: Vec<Op>,
        fail_creates_at: Option<GridPos>,
    }

    impl RecordingSurface {
        fn take_ops(&mut self) -> Vec<Op> {
            std::mem::take(&mut self.ops)
        }
    }

    impl TileSurface for RecordingSurface {
        type Node = GridPos;
        type Error = String;

        fn create(&mut self, pos: GridPos, _visual: &TileVisual) -> Result<GridPos, String> {
            if self.fail_creates_at == Some(pos) {
                return Err("surface unavailable".into());
            }
            self.ops.push(Op::Create(pos));
            Ok(pos)
        }

        fn update(&mut self, node: &mut GridPos, _visual: &TileVisual) -> Result<(), String> {
            self.ops.push(Op::Update(*node));
            Ok(())
        }

        fn remove(&mut self, node: GridPos) {
            self.ops.push(Op::Remove(node));
        }
    }

    fn parcel(x: i64, y: i64, id: Option<i64>, owner: Option<&str>) -> Parcel {
        Parcel {
            id,
            x,
            y,
            owner_address: owner.map(str::to_string),
            ..Parcel::default()
        }
    }

    fn owned_building(x: i64, y: i64, id: i64, owner: &str) -> Parcel {
        Parcel {
            building_type: Some("Factory".into()),
            building_variant: Some("Blue".into()),
            rarity: Some("legendary".into()),
            ..parcel(x, y, Some(id), Some(owner))
        }
    }

    fn sorted_keys<S: TileSurface>(cache: &RenderCache<S>) -> Vec<GridPos> {
        let mut keys: Vec<_> = cache.keys().collect();
        keys.sort();
        keys
    }

    #[test]
    fn two_parcel_scenario_creates_then_evicts() {
        let mut cache = RenderCache::new(RecordingSurface::default());
        let first = vec![
            parcel(0, 0, Some(1), None),
            owned_building(1, 0, 2, "kaspa:abc"),
        ];

        let report = cache.reconcile(&first, 2, None);
        assert_eq!(report.created, 2);
        assert_eq!(
            cache.visual(GridPos::new(1, 0)).map(|v| &v.sprite),
            Some(&Sprite::Building {
                kind: "factory".into(),
                variant: "blue".into()
            })
        );
        assert_eq!(
            cache.visual(GridPos::new(0, 0)).map(|v| &v.sprite),
            Some(&Sprite::Placeholder)
        );

        let second = vec![parcel(0, 0, Some(1), None)];
        let report = cache.reconcile(&second, 2, None);
        assert_eq!(report.evicted, 1);
        assert_eq!(report.created, 0);
        assert_eq!(sorted_keys(&cache), vec![GridPos::new(0, 0)]);
        assert!(
            cache
                .surface()
                .ops
                .contains(&Op::Remove(GridPos::new(1, 0)))
        );
    }

    #[test]
    fn second_identical_reconcile_is_a_no_op() {
        let mut cache = RenderCache::new(RecordingSurface::default());
        let parcels = vec![
            parcel(0, 0, Some(1), None),
            owned_building(1, 1, 2, "kaspa:abc"),
        ];
        cache.reconcile(&parcels, 3, Some("kaspa:abc"));
        cache.surface.take_ops();

        let report = cache.reconcile(&parcels, 3, Some("kaspa:abc"));
        assert_eq!(report.created, 0);
        assert_eq!(report.evicted, 0);
        assert_eq!(report.unchanged, 2);
        assert!(cache.surface().ops.is_empty());
    }

    #[test]
    fn ownership_highlight_follows_the_account_without_recreating() {
        let mut cache = RenderCache::new(RecordingSurface::default());
        let parcels = vec![
            parcel(0, 0, Some(1), None),
            owned_building(1, 0, 2, "kaspa:abc"),
        ];
        let pos = GridPos::new(1, 0);

        cache.reconcile(&parcels, 2, Some("kaspa:abc"));
        assert_eq!(cache.visual(pos).map(|v| v.user_owned), Some(true));
        cache.surface.take_ops();

        let report = cache.reconcile(&parcels, 2, None);
        assert_eq!(cache.visual(pos).map(|v| v.user_owned), Some(false));
        assert_eq!(report.updated, 1);
        assert_eq!(cache.surface().ops, vec![Op::Update(pos)]);
    }

    #[test]
    fn invalid_parcels_never_reach_the_surface() {
        let mut cache = RenderCache::new(RecordingSurface::default());
        let parcels = vec![
            parcel(0, 0, None, None),
            parcel(0, 1, Some(0), None),
            parcel(5, 0, Some(3), None),
            parcel(-1, 0, Some(4), None),
            parcel(1, 1, Some(5), None),
        ];
        let report = cache.reconcile(&parcels, 2, None);
        assert_eq!(report.dropped, 4);
        assert_eq!(sorted_keys(&cache), vec![GridPos::new(1, 1)]);
        assert_eq!(cache.surface().ops, vec![Op::Create(GridPos::new(1, 1))]);
    }

    #[test]
    fn failed_creation_is_counted_and_retried_next_pass() {
        let mut cache = RenderCache::new(RecordingSurface {
            fail_creates_at: Some(GridPos::new(0, 0)),
            ..RecordingSurface::default()
        });
        let parcels = vec![parcel(0, 0, Some(1), None), parcel(1, 0, Some(2), None)];
        let report = cache.reconcile(&parcels, 2, None);
        assert_eq!(report.failed, 1);
        assert_eq!(report.created, 1);
        assert!(!cache.contains(GridPos::new(0, 0)));

        cache.surface.fail_creates_at = None;
        let report = cache.reconcile(&parcels, 2, None);
        assert_eq!(report.created, 1);
        assert!(cache.contains(GridPos::new(0, 0)));
    }

    #[test]
    fn clear_removes_every_node() {
        let mut cache = RenderCache::new(RecordingSurface::default());
        let parcels = vec![parcel(0, 0, Some(1), None), parcel(1, 1, Some(2), None)];
        cache.reconcile(&parcels, 2, None);
        cache.clear();
        assert!(cache.is_empty());

        let removed = cache
            .surface()
            .ops
            .iter()
            .filter(|op| matches!(op, Op::Remove(_)))
            .count();
        assert_eq!(removed, 2);

        // Nodes are rebuilt from scratch after a clear.
        let report = cache.reconcile(&parcels, 2, None);
        assert_eq!(report.created, 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn owned_parcel_without_variant_falls_back_to_placeholder() {
        let p = Parcel {
            building_variant: None,
            ..owned_building(0, 0, 1, "kaspa:abc")
        };
        let visual = TileVisual::for_parcel(&p, None);
        assert_eq!(visual.sprite, Sprite::Placeholder);
        assert_eq!(visual.rarity, None);
        assert_eq!(visual.class_name, "tile factory");
        assert_eq!(visual.sprite.src(), "/static/images/parcelle.webp");
    }

    #[test]
    fn visual_carries_badges_and_classes() {
        let p = Parcel {
            is_for_sale: true,
            ..owned_building(0, 0, 1, "kaspa:abc")
        };
        let visual = TileVisual::for_parcel(&p, Some("kaspa:abc"));
        assert_eq!(visual.sprite.src(), "/static/images/factory_blue.webp");
        assert_eq!(
            visual.rarity,
            Some(RarityBadge {
                class: "legendary".into(),
                letter: "L".into()
            })
        );
        assert_eq!(visual.sale_label(), Some("FOR SALE"));
        assert_eq!(visual.class_list(), "tile factory for-sale user-owned");

        let plain = TileVisual::for_parcel(&parcel(0, 0, Some(1), None), Some(""));
        assert_eq!(plain.class_list(), "tile parcel");
        assert!(!plain.user_owned);
    }

    fn arb_parcel() -> impl Strategy<Value = Parcel> {
        (
            -2i64..12,
            -2i64..12,
            prop::option::of(0i64..4),
            prop::option::of(prop::sample::select(vec!["kaspa:a", "kaspa:b"])),
        )
            .prop_map(|(x, y, id, owner)| parcel(x, y, id, owner))
    }

    proptest! {
        #[test]
        fn cache_keys_match_valid_coordinates(
            batches in prop::collection::vec(prop::collection::vec(arb_parcel(), 0..40), 1..5),
            map_size in 1u32..10,
        ) {
            let mut cache = RenderCache::new(RecordingSurface::default());
            for batch in batches {
                cache.reconcile(&batch, map_size, Some("kaspa:a"));
                let expected: HashSet<GridPos> = batch
                    .iter()
                    .filter_map(|p| validate(p, map_size).ok())
                    .collect();
                let actual: HashSet<GridPos> = cache.keys().collect();
                prop_assert_eq!(actual, expected);
            }
        }
    }
}
