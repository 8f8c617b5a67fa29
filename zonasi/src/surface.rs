//! Surface de rendu fournie par l'hôte (conteneur de la carte)

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ZonasiError;

/// Longueur CSS utilisée pour la hauteur du conteneur
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CssLength {
    Px(f64),
    Percent(f64),
    Vh(f64),
}

impl Default for CssLength {
    fn default() -> Self {
        Self::Px(500.0)
    }
}

impl FromStr for CssLength {
    type Err = ZonasiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || ZonasiError::InvalidLength(s.to_string());

        let (number, ctor): (&str, fn(f64) -> Self) = if let Some(n) = s.strip_suffix("px") {
            (n, Self::Px)
        } else if let Some(n) = s.strip_suffix('%') {
            (n, Self::Percent)
        } else if let Some(n) = s.strip_suffix("vh") {
            (n, Self::Vh)
        } else {
            return Err(invalid());
        };

        let value: f64 = number.trim().parse().map_err(|_| invalid())?;
        if !value.is_finite() || value < 0.0 {
            return Err(invalid());
        }
        Ok(ctor(value))
    }
}

impl TryFrom<String> for CssLength {
    type Error = ZonasiError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CssLength> for String {
    fn from(length: CssLength) -> Self {
        length.to_string()
    }
}

impl fmt::Display for CssLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Px(v) => write!(f, "{v}px"),
            Self::Percent(v) => write!(f, "{v}%"),
            Self::Vh(v) => write!(f, "{v}vh"),
        }
    }
}

/// Identifiant d'un gestionnaire de carte ayant réservé une surface
pub type OwnerId = u64;

#[derive(Debug)]
struct SurfaceInner {
    id: String,
    height: CssLength,
    size: Cell<(u32, u32)>,
    mounted: Cell<bool>,
    owner: Cell<Option<OwnerId>>,
}

/// Conteneur de rendu partagé entre l'hôte et le moteur.
///
/// Les clones désignent la même surface. Une surface ne peut être réservée
/// que par un seul gestionnaire de carte à la fois.
#[derive(Debug, Clone)]
pub struct Surface {
    inner: Rc<SurfaceInner>,
}

impl Surface {
    /// Surface montée, de taille nulle tant que l'hôte ne l'a pas mesurée
    pub fn new(id: impl Into<String>, height: CssLength) -> Self {
        Self {
            inner: Rc::new(SurfaceInner {
                id: id.into(),
                height,
                size: Cell::new((0, 0)),
                mounted: Cell::new(true),
                owner: Cell::new(None),
            }),
        }
    }

    pub fn with_size(self, width: u32, height: u32) -> Self {
        self.set_size(width, height);
        self
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    pub fn height(&self) -> CssLength {
        self.inner.height
    }

    /// Taille en pixels (largeur, hauteur)
    pub fn size(&self) -> (u32, u32) {
        self.inner.size.get()
    }

    pub fn set_size(&self, width: u32, height: u32) {
        self.inner.size.set((width, height));
    }

    /// Une surface hors écran (layout pas encore appliqué) a une taille nulle
    pub fn is_visible(&self) -> bool {
        let (w, h) = self.size();
        self.is_mounted() && w > 0 && h > 0
    }

    pub fn is_mounted(&self) -> bool {
        self.inner.mounted.get()
    }

    /// Retire la surface du document hôte
    pub fn unmount(&self) {
        self.inner.mounted.set(false);
    }

    pub fn owner(&self) -> Option<OwnerId> {
        self.inner.owner.get()
    }

    /// Réserve la surface ; échoue si un autre gestionnaire la détient déjà
    pub(crate) fn claim(&self, owner: OwnerId) -> bool {
        match self.inner.owner.get() {
            None => {
                self.inner.owner.set(Some(owner));
                true
            }
            Some(current) => current == owner,
        }
    }

    /// Libère la surface si elle est détenue par `owner`
    pub(crate) fn release(&self, owner: OwnerId) {
        if self.inner.owner.get() == Some(owner) {
            self.inner.owner.set(None);
        }
    }

    /// Deux handles désignent-ils la même surface ?
    pub fn same_as(&self, other: &Surface) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}
