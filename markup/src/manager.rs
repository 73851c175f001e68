use std::collections::BTreeMap;

use anyhow::Result;
use xmltree::Element;

use crate::perma::{node_elements, root_element};
use crate::{HostNetwork, Markup, MarkupConfig, NodeID, ObjectsMap};

/// Every node's markup. Markup is created the first time a node is touched.
pub struct MarkupManager {
    config: MarkupConfig,
    markups: BTreeMap<NodeID, Markup>,
    load_errors: usize,
}

impl MarkupManager {
    pub fn new(config: MarkupConfig) -> MarkupManager {
        MarkupManager {
            config,
            markups: BTreeMap::new(),
            load_errors: 0,
        }
    }

    pub fn config(&self) -> &MarkupConfig {
        &self.config
    }

    pub fn contains(&self, id: NodeID) -> bool {
        self.markups.contains_key(&id)
    }

    /// Creates the markup for a node if it doesn't exist yet.
    pub fn get(&mut self, id: NodeID, host: &dyn HostNetwork) -> Result<&mut Markup> {
        if !self.markups.contains_key(&id) {
            let markup = Markup::new(id, host, self.config.clone())?;
            self.markups.insert(id, markup);
        }
        self.markups
            .get_mut(&id)
            .ok_or_else(|| anyhow!("{} vanished", id))
    }

    pub fn try_get(&self, id: NodeID) -> Option<&Markup> {
        self.markups.get(&id)
    }

    pub fn try_get_mut(&mut self, id: NodeID) -> Option<&mut Markup> {
        self.markups.get_mut(&id)
    }

    pub fn markups(&self) -> impl Iterator<Item = &Markup> {
        self.markups.values()
    }

    pub fn markups_mut(&mut self) -> impl Iterator<Item = &mut Markup> {
        self.markups.values_mut()
    }

    /// The host calls this whenever a node or one of its segments changes. Markup on nodes that
    /// are gone is dropped.
    pub fn on_node_changed(&mut self, id: NodeID, host: &dyn HostNetwork) -> Result<()> {
        if !self.markups.contains_key(&id) {
            return Ok(());
        }
        if host.node(id).is_none() {
            info!("{} is gone, dropping its markup", id);
            self.markups.remove(&id);
            return Ok(());
        }
        if let Some(markup) = self.markups.get_mut(&id) {
            markup.update(host)?;
        }
        Ok(())
    }

    pub fn remove(&mut self, id: NodeID) -> Option<Markup> {
        self.markups.remove(&id)
    }

    /// Forgets everything, like when the host loads a different network.
    pub fn unload(&mut self) {
        self.markups.clear();
        self.load_errors = 0;
    }

    pub fn to_xml(&self) -> Element {
        root_element(
            self.markups
                .values()
                .filter(|m| !m.is_empty())
                .map(|m| m.to_xml())
                .collect(),
        )
    }

    /// Loads every node in a saved document. A node that fails to load is discarded and counted,
    /// without stopping the others. Returns how many nodes loaded.
    pub fn load_xml(
        &mut self,
        root: &Element,
        host: &dyn HostNetwork,
        map: &ObjectsMap,
    ) -> usize {
        let mut loaded = 0;
        for elem in node_elements(root) {
            match self.load_node(elem, host, map) {
                Ok(()) => {
                    loaded += 1;
                }
                Err(err) => {
                    error!("Couldn't load markup: {:#}", err);
                    self.load_errors += 1;
                }
            }
        }
        if self.load_errors > 0 {
            info!("{}", self.load_error_notice().unwrap_or_default());
        }
        loaded
    }

    fn load_node(&mut self, elem: &Element, host: &dyn HostNetwork, map: &ObjectsMap) -> Result<()> {
        let id = Markup::node_id_from_xml(elem, map)?;
        let result = self
            .get(id, host)
            .and_then(|markup| markup.load_xml(elem, map));
        if let Err(err) = result {
            self.markups.remove(&id);
            return Err(err.context(format!("loading {}", id)));
        }
        Ok(())
    }

    pub fn load_errors(&self) -> usize {
        self.load_errors
    }

    pub fn load_error_notice(&self) -> Option<String> {
        match self.load_errors {
            0 => None,
            1 => Some("1 node failed to load".to_string()),
            n => Some(format!(
                "{} nodes failed to load",
                abstutil::prettyprint_usize(n)
            )),
        }
    }
}
