use std::collections::HashMap;

use tableau_engine::texture::TextureId;

use crate::color_key::ColorKey;
use crate::definition::ItemDef;
use crate::error::SceneError;

/// Index of an item inside its [`ItemRegistry`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ItemId(u32);

impl ItemId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A named hotspot resolved against the texture cache.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractiveItem {
    pub name: String,
    pub key: ColorKey,
    /// `None` when the mask texture is missing; the item then never hits.
    pub mask: Option<TextureId>,
    pub mask_name: String,
    pub render_order: i32,
    pub description: String,
}

/// Arena of the scene's items plus a color→item index.
#[derive(Debug, Default)]
pub struct ItemRegistry {
    items: Vec<InteractiveItem>,
    by_key: HashMap<ColorKey, ItemId>,
}

impl ItemRegistry {
    /// Builds the registry; rejects the reserved key and any duplicate key or name.
    pub fn new(items: Vec<InteractiveItem>) -> Result<Self, SceneError> {
        let mut by_key = HashMap::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            if item.key.is_none() {
                return Err(SceneError::ReservedColorKey(item.key));
            }
            if let Some(prev) = by_key.insert(item.key, ItemId(i as u32)) {
                return Err(SceneError::DuplicateColorKey {
                    key: item.key,
                    first: items[prev.index()].name.clone(),
                    second: item.name.clone(),
                });
            }
            if items[..i].iter().any(|other| other.name == item.name) {
                return Err(SceneError::DuplicateItemName(item.name.clone()));
            }
        }
        Ok(Self { items, by_key })
    }

    /// Resolves item definitions, looking masks up through `resolve`.
    pub fn from_defs(
        defs: &[ItemDef],
        mut resolve: impl FnMut(&str) -> Option<TextureId>,
    ) -> Result<Self, SceneError> {
        let items = defs
            .iter()
            .map(|def| InteractiveItem {
                name: def.name.clone(),
                key: def.color,
                mask: resolve(&def.mask),
                mask_name: def.mask.clone(),
                render_order: def.render_order,
                description: def.description.clone(),
            })
            .collect();
        Self::new(items)
    }

    /// Exact color match. `ColorKey::NONE` never resolves.
    pub fn resolve(&self, key: ColorKey) -> Option<ItemId> {
        self.by_key.get(&key).copied()
    }

    pub fn get(&self, id: ItemId) -> Option<&InteractiveItem> {
        self.items.get(id.index())
    }

    /// Finds an item by its name or its mask texture name.
    pub fn by_name(&self, name: &str) -> Option<ItemId> {
        self.items
            .iter()
            .position(|item| item.name == name || item.mask_name == name)
            .map(|i| ItemId(i as u32))
    }

    pub fn iter(&self) -> impl Iterator<Item = (ItemId, &InteractiveItem)> {
        self.items.iter().enumerate().map(|(i, item)| (ItemId(i as u32), item))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, key: ColorKey) -> InteractiveItem {
        InteractiveItem {
            name: name.into(),
            key,
            mask: None,
            mask_name: format!("{name}_mask"),
            render_order: 0,
            description: String::new(),
        }
    }

    #[test]
    fn resolves_exact_keys_only() {
        let reg = ItemRegistry::new(vec![
            item("door", ColorKey::new(255, 0, 0)),
            item("chest", ColorKey::new(0, 255, 0)),
        ])
        .unwrap();

        let door = reg.resolve(ColorKey::new(255, 0, 0)).unwrap();
        assert_eq!(reg.get(door).map(|i| i.name.as_str()), Some("door"));
        assert_eq!(reg.resolve(ColorKey::new(254, 0, 0)), None);
        assert_eq!(reg.resolve(ColorKey::NONE), None);
    }

    #[test]
    fn rejects_duplicates_and_reserved() {
        let dup = ItemRegistry::new(vec![
            item("a", ColorKey::new(9, 9, 9)),
            item("b", ColorKey::new(9, 9, 9)),
        ]);
        assert!(matches!(dup, Err(SceneError::DuplicateColorKey { .. })));

        let reserved = ItemRegistry::new(vec![item("a", ColorKey::NONE)]);
        assert!(matches!(reserved, Err(SceneError::ReservedColorKey(_))));

        let names = ItemRegistry::new(vec![
            item("a", ColorKey::new(1, 0, 0)),
            item("a", ColorKey::new(2, 0, 0)),
        ]);
        assert!(matches!(names, Err(SceneError::DuplicateItemName(_))));
    }

    #[test]
    fn by_name_matches_mask_names_too() {
        let reg = ItemRegistry::new(vec![item("door", ColorKey::new(1, 2, 3))]).unwrap();
        assert_eq!(reg.by_name("door"), reg.by_name("door_mask"));
        assert!(reg.by_name("door").is_some());
        assert_eq!(reg.by_name("window"), None);
    }
}
