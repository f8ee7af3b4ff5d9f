//! Styling binding metadata
//!
//! Each `[class.foo]`, `[style.width.px]`, `[class]` or `[style]` binding site on a node owns two
//! consecutive slots: the bound value at `index` and the concatenated text up to and including
//! that binding at `index + 1`. The static half of the entry ([`TStylingKey`] plus its
//! [`TStylingLink`]) lives in the TView data at `index` and chains every binding of one kind on
//! one node into a priority list, lowest priority first.

/// What a binding site writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TStylingKey {
    /// A single class or style property, with an optional unit suffix (`px`, `em`, ...).
    Prop {
        name: String,
        suffix: Option<String>,
    },
    /// `[class]="..."`
    ClassMap,
    /// `[style]="..."`
    StyleMap,
}

impl TStylingKey {
    pub fn prop(name: impl Into<String>) -> Self {
        TStylingKey::Prop {
            name: name.into(),
            suffix: None,
        }
    }

    pub fn prop_with_suffix(name: impl Into<String>, suffix: Option<&str>) -> Self {
        TStylingKey::Prop {
            name: name.into(),
            suffix: suffix.map(str::to_string),
        }
    }

    /// Property name, or `None` for map bindings which may collide with any key.
    pub fn key(&self) -> Option<&str> {
        match self {
            TStylingKey::Prop { name, .. } => Some(name),
            TStylingKey::ClassMap | TStylingKey::StyleMap => None,
        }
    }

    pub fn is_map(&self) -> bool {
        self.key().is_none()
    }
}

/// Links of one binding inside its node's priority list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TStylingLink {
    pub prev: Option<usize>,
    pub next: Option<usize>,
    /// A lower priority binding (or the static value) may write the same key.
    pub prev_duplicate: bool,
    /// A higher priority binding may write the same key.
    pub next_duplicate: bool,
}

/// Head and tail of a node's binding list for one kind (class or style).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TStylingRange {
    pub head: Option<usize>,
    pub tail: Option<usize>,
}

impl TStylingRange {
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }
}

