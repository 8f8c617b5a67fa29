//! Événements émis par la carte vers l'hôte

use crate::types::PlanningFeature;

/// Événement typé émis une seule fois par transition d'état
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MapEvent<'a> {
    /// La carte est prête à recevoir rendus et interactions
    Ready,
    /// Feature survolée, ou `None` quand le pointeur quitte la feature
    HoverChanged(Option<&'a PlanningFeature>),
    /// Feature cliquée
    SelectionChanged(&'a PlanningFeature),
}

/// Identifiant d'abonnement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(&MapEvent<'_>)>;

/// Liste des abonnés aux événements de la carte
#[derive(Default)]
pub struct EventBus {
    next_id: u64,
    listeners: Vec<(ListenerId, Listener)>,
}

impl EventBus {
    pub fn subscribe(&mut self, listener: impl FnMut(&MapEvent<'_>) + 'static) -> ListenerId {
        self.next_id += 1;
        let id = ListenerId(self.next_id);
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(l, _)| *l != id);
        self.listeners.len() != before
    }

    pub fn emit(&mut self, event: MapEvent<'_>) {
        for (_, listener) in self.listeners.iter_mut() {
            listener(&event);
        }
    }

    /// Détache tous les abonnés
    pub fn clear(&mut self) {
        self.listeners.clear();
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
