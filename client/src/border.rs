//! Decorative trees scattered around the playable diamond.

use rand::Rng;
use web_sys::{Document, HtmlElement};

use kasland_shared::GridPos;

use crate::config::IMAGE_BASE;
use crate::iso;
use crate::tile_dom::DomError;

/// Cells beyond the map edge that may hold a tree.
const BAND: i64 = 20;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Density {
    chance: f64,
    min_scale: f64,
    max_scale: f64,
}

const DESKTOP: Density = Density {
    chance: 0.07,
    min_scale: 0.8,
    max_scale: 1.2,
};

const MOBILE: Density = Density {
    chance: 0.005,
    min_scale: 0.6,
    max_scale: 0.9,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeKind {
    Tree1,
    Tree2,
}

impl TreeKind {
    fn sprite(self) -> &'static str {
        match self {
            TreeKind::Tree1 => "tree1",
            TreeKind::Tree2 => "tree2",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeSprite {
    pub pos: GridPos,
    pub kind: TreeKind,
    pub scale: f64,
}

/// Pick tree positions in the band around a `map_size` map.
pub fn plan_border(map_size: u32, mobile: bool, rng: &mut impl Rng) -> Vec<TreeSprite> {
    let density = if mobile { MOBILE } else { DESKTOP };
    let n = i64::from(map_size);
    let mut trees = Vec::new();

    for i in -BAND..n + BAND {
        for j in -BAND..n + BAND {
            let pos = GridPos::new(i, j);
            if pos.in_bounds(map_size) {
                continue;
            }
            if !rng.gen_bool(density.chance) {
                continue;
            }
            let kind = if rng.gen_bool(0.5) {
                TreeKind::Tree1
            } else {
                TreeKind::Tree2
            };
            let scale = rng.gen_range(density.min_scale..density.max_scale);
            trees.push(TreeSprite { pos, kind, scale });
        }
    }
    trees
}

/// Append the planned trees to the map layer. Returns how many were placed.
pub fn place_border(
    document: &Document,
    layer: &HtmlElement,
    trees: &[TreeSprite],
) -> Result<usize, DomError> {
    for tree in trees {
        let wrapper = document.create_element("div")?;
        wrapper.set_class_name("tree");
        let image = document.create_element("img")?;
        image.set_attribute("src", &format!("{IMAGE_BASE}/{}.webp", tree.kind.sprite()))?;
        image.set_attribute("draggable", "false")?;
        image.set_attribute("style", &format!("transform: scale({:.3})", tree.scale))?;
        wrapper.append_child(&image)?;

        let (left, top) = iso::tile_origin(tree.pos);
        wrapper.set_attribute("style", &format!("left: {left}px; top: {top}px"))?;
        layer.append_child(&wrapper)?;
    }
    Ok(trees.len())
}
