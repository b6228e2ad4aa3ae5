use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;

use log::{debug, error, info, warn};

use crate::addon::{Addon, AddonContext, AddonMeta, AddonState, Phase};
use crate::command::{CommandRegistry, CommandSender};
use crate::config::HostConfig;
use crate::error::{guard, AddonError};
use crate::event::{AddonDisableEvent, AddonEnableEvent, Event, EventRegistry};

struct Slot {
    meta: AddonMeta,
    addon: Box<dyn Addon>,
    state: AddonState,
}

pub struct LifecycleController {
    slots: Vec<Slot>,
    commands: CommandRegistry,
    events: EventRegistry,
    config: HostConfig,
}

impl LifecycleController {
    pub fn new(addons_dir: impl Into<PathBuf>) -> Self {
        Self::from_config(&HostConfig {
            addons_dir: addons_dir.into(),
            ..HostConfig::default()
        })
    }

    pub fn from_config(config: &HostConfig) -> Self {
        LifecycleController {
            slots: Vec::new(),
            commands: CommandRegistry::new(),
            events: EventRegistry::new(),
            config: config.clone(),
        }
    }

    fn index_of(&self, id: &str) -> Option<usize> {
        self.slots.iter().position(|slot| slot.meta.id == id)
    }

    fn find(&self, id: &str) -> Result<usize, AddonError> {
        self.index_of(id).ok_or_else(|| AddonError::UnknownAddon(id.to_owned()))
    }

    /// Orders `addons` by their dependencies and runs `on_load` on each.
    ///
    /// Addons caught in a dependency cycle, or depending on one, stay
    /// unloaded; everything else continues. Returns one error per failure.
    pub fn load_all(&mut self, addons: Vec<Box<dyn Addon>>) -> Vec<AddonError> {
        let mut errors = Vec::new();
        let mut pending: Vec<Slot> = Vec::new();

        for addon in addons {
            let meta = addon.meta().clone();
            if self.index_of(&meta.id).is_some() || pending.iter().any(|slot| slot.meta.id == meta.id) {
                let err = AddonError::DuplicateAddon(meta.id);
                error!("{}", err);
                errors.push(err);
                continue;
            }

            pending.push(Slot {
                meta,
                addon,
                state: AddonState::Unloaded,
            });
        }

        let (ordered, pending) = topological(pending);
        errors.extend(unresolvable(&pending));

        for mut slot in ordered {
            let outcome = {
                let mut ctx = AddonContext::new(
                    &slot.meta,
                    Phase::Loading,
                    &self.config.addons_dir,
                    &mut self.commands,
                    &mut self.events,
                );
                guard(|| slot.addon.on_load(&mut ctx))
            };

            match outcome {
                Ok(()) => {
                    slot.state = AddonState::Loaded;
                    info!("[{}] Loaded {} v{}.", slot.meta.id, slot.meta.name, slot.meta.version);
                }
                Err(e) => {
                    let err = AddonError::handler(&slot.meta.id, "on_load", e);
                    error!("{}", err);
                    errors.push(err);
                }
            }

            self.slots.push(slot);
        }

        self.slots.extend(pending);
        self.reorder();
        errors
    }

    /// Restores dependency order across everything loaded so far, since a
    /// later batch may hold the dependencies of an earlier one.
    fn reorder(&mut self) {
        let (mut ordered, leftover) = topological(std::mem::take(&mut self.slots));
        ordered.extend(leftover);
        self.slots = ordered;
    }

    pub fn enable_all(&mut self) -> Vec<AddonError> {
        let mut errors = Vec::new();

        for i in 0..self.slots.len() {
            let slot = &self.slots[i];
            if !matches!(slot.state, AddonState::Loaded | AddonState::Disabled) {
                continue;
            }
            if self.config.is_disabled(&slot.meta.id) {
                info!("[{}] Disabled in the host configuration, skipping.", slot.meta.id);
                continue;
            }

            if let Err(err) = self.enable_at(i) {
                errors.push(err);
            }
        }

        errors
    }

    pub fn enable(&mut self, id: &str) -> Result<(), AddonError> {
        let i = self.find(id)?;
        let state = self.slots[i].state;
        if !matches!(state, AddonState::Loaded | AddonState::Disabled) {
            return Err(AddonError::InvalidState {
                addon: id.to_owned(),
                state,
                expected: AddonState::Loaded,
            });
        }

        self.enable_at(i)
    }

    fn enable_at(&mut self, i: usize) -> Result<(), AddonError> {
        let missing = self.slots[i]
            .meta
            .dependencies
            .iter()
            .find(|dep| self.state(dep) != Some(AddonState::Enabled))
            .cloned();

        if let Some(dependency) = missing {
            let err = AddonError::MissingDependency {
                addon: self.slots[i].meta.id.clone(),
                dependency,
            };
            warn!("{}, not enabling it.", err);
            return Err(err);
        }

        let slot = &mut self.slots[i];
        let outcome = {
            let mut ctx = AddonContext::new(
                &slot.meta,
                Phase::Enabling,
                &self.config.addons_dir,
                &mut self.commands,
                &mut self.events,
            );
            guard(|| slot.addon.on_enable(&mut ctx))
        };

        if let Err(e) = outcome {
            let id = slot.meta.id.clone();
            self.purge(&id);
            let err = AddonError::handler(&id, "on_enable", e);
            error!("{}", err);
            return Err(err);
        }

        slot.state = AddonState::Enabled;
        info!("[{}] Enabled {} v{}.", slot.meta.id, slot.meta.name, slot.meta.version);

        let event = AddonEnableEvent::new(&slot.meta);
        self.events.dispatch(&event);
        Ok(())
    }

    /// Disables `id`, after first disabling every enabled addon that
    /// depends on it.
    pub fn disable(&mut self, id: &str) -> Result<(), AddonError> {
        let i = self.find(id)?;
        let state = self.slots[i].state;
        if state != AddonState::Enabled {
            return Err(AddonError::InvalidState {
                addon: id.to_owned(),
                state,
                expected: AddonState::Enabled,
            });
        }

        let dependents: Vec<String> = self
            .slots
            .iter()
            .rev()
            .filter(|slot| slot.state == AddonState::Enabled && slot.meta.dependencies.iter().any(|dep| dep == id))
            .map(|slot| slot.meta.id.clone())
            .collect();

        let mut first_error = None;
        for dependent in dependents {
            if self.state(&dependent) == Some(AddonState::Enabled) {
                debug!("[{}] Disabling because {} is going away.", dependent, id);
                if let Err(err) = self.disable(&dependent) {
                    first_error.get_or_insert(err);
                }
            }
        }

        let outcome = self.disable_at(i);
        match first_error {
            Some(err) => Err(err),
            None => outcome,
        }
    }

    pub fn disable_all(&mut self) -> Vec<AddonError> {
        let mut errors = Vec::new();

        for i in (0..self.slots.len()).rev() {
            if self.slots[i].state == AddonState::Enabled {
                if let Err(err) = self.disable_at(i) {
                    errors.push(err);
                }
            }
        }

        errors
    }

    /// Runs `on_disable` and purges the addon's registrations. The addon ends
    /// up disabled even when its hook fails.
    fn disable_at(&mut self, i: usize) -> Result<(), AddonError> {
        let event = AddonDisableEvent::new(&self.slots[i].meta);
        self.events.dispatch(&event);

        let slot = &mut self.slots[i];
        let outcome = {
            let mut ctx = AddonContext::new(
                &slot.meta,
                Phase::Disabling,
                &self.config.addons_dir,
                &mut self.commands,
                &mut self.events,
            );
            guard(|| slot.addon.on_disable(&mut ctx))
        };

        slot.state = AddonState::Disabled;
        let id = slot.meta.id.clone();
        self.purge(&id);
        info!("[{}] Disabled.", id);

        outcome.map_err(|e| {
            let err = AddonError::handler(&id, "on_disable", e);
            error!("{}", err);
            err
        })
    }

    fn purge(&mut self, id: &str) {
        let commands = self.commands.unregister_all(id);
        let bindings = self.events.unregister_all(id);
        debug!("[{}] Removed {} command(s) and {} event binding(s).", id, commands, bindings);
    }

    pub fn unload_all(&mut self) -> Vec<AddonError> {
        let errors = self.disable_all();
        for slot in self.slots.drain(..) {
            debug!("[{}] Unloaded.", slot.meta.id);
        }
        errors
    }

    /// Runs `on_reload` on one enabled addon. Dependents are left alone.
    pub fn reload(&mut self, id: &str) -> Result<(), AddonError> {
        let i = self.find(id)?;
        let slot = &mut self.slots[i];
        if slot.state != AddonState::Enabled {
            return Err(AddonError::InvalidState {
                addon: id.to_owned(),
                state: slot.state,
                expected: AddonState::Enabled,
            });
        }

        let outcome = {
            let mut ctx = AddonContext::new(
                &slot.meta,
                Phase::Reloading,
                &self.config.addons_dir,
                &mut self.commands,
                &mut self.events,
            );
            guard(|| slot.addon.on_reload(&mut ctx))
        };

        match outcome {
            Ok(()) => {
                info!("[{}] Reloaded.", id);
                Ok(())
            }
            Err(e) => {
                let err = AddonError::handler(id, "on_reload", e);
                error!("{}", err);
                Err(err)
            }
        }
    }

    pub fn state(&self, id: &str) -> Option<AddonState> {
        self.index_of(id).map(|i| self.slots[i].state)
    }

    pub fn addons(&self) -> Vec<(&AddonMeta, AddonState)> {
        self.slots.iter().map(|slot| (&slot.meta, slot.state)).collect()
    }

    pub fn commands(&self) -> &CommandRegistry {
        &self.commands
    }

    pub fn events(&self) -> &EventRegistry {
        &self.events
    }

    pub fn dispatch_command(&self, label: &str, sender: &dyn CommandSender, args: &[String]) -> Result<bool, AddonError> {
        self.commands.dispatch(label, sender, args)
    }

    pub fn complete(&self, label: &str, sender: &dyn CommandSender, args: &[String]) -> Vec<String> {
        self.commands.complete(label, sender, args)
    }

    pub fn fire(&self, event: &dyn Event) -> usize {
        self.events.dispatch(event)
    }
}

/// Stable Kahn ordering: repeatedly takes the first slot with no dependency
/// left among the remaining ones. Returns the ordered slots and whatever
/// could not be placed.
fn topological(mut pending: Vec<Slot>) -> (Vec<Slot>, Vec<Slot>) {
    let mut ordered = Vec::with_capacity(pending.len());
    while let Some(ready) = pending.iter().position(|slot| {
        slot.meta
            .dependencies
            .iter()
            .all(|dep| !pending.iter().any(|other| &other.meta.id == dep))
    }) {
        ordered.push(pending.remove(ready));
    }
    (ordered, pending)
}

/// Explains why each leftover addon could not be ordered: one cycle error
/// per strongly connected component, a missing-dependency error for
/// anything that only depends on a cycle.
fn unresolvable(leftover: &[Slot]) -> Vec<AddonError> {
    let index: HashMap<&str, usize> = leftover
        .iter()
        .enumerate()
        .map(|(i, slot)| (slot.meta.id.as_str(), i))
        .collect();
    let edges: Vec<Vec<usize>> = leftover
        .iter()
        .map(|slot| {
            slot.meta
                .dependencies
                .iter()
                .filter_map(|dep| index.get(dep.as_str()).copied())
                .collect()
        })
        .collect();

    let mut component_of = vec![usize::MAX; leftover.len()];
    let mut cyclic = vec![false; leftover.len()];
    for (c, members) in components(&edges).into_iter().enumerate() {
        let looped = members.len() > 1 || edges[members[0]].contains(&members[0]);
        for &member in &members {
            component_of[member] = c;
            cyclic[member] = looped;
        }
    }

    let mut errors = Vec::new();
    for (i, slot) in leftover.iter().enumerate() {
        if cyclic[i] {
            let first = (0..i).all(|j| component_of[j] != component_of[i]);
            if first {
                let cycle = cycle_through(i, &edges, &component_of)
                    .into_iter()
                    .map(|member| leftover[member].meta.id.clone())
                    .collect();
                let err = AddonError::DependencyCycle(cycle);
                error!("{}", err);
                errors.push(err);
            }
            continue;
        }

        let dependency = slot
            .meta
            .dependencies
            .iter()
            .find(|dep| index.contains_key(dep.as_str()))
            .cloned()
            .unwrap_or_default();
        let err = AddonError::MissingDependency {
            addon: slot.meta.id.clone(),
            dependency,
        };
        error!("{}, not loading it.", err);
        errors.push(err);
    }

    errors
}

/// Tarjan's strongly connected components, driven by an explicit stack.
fn components(edges: &[Vec<usize>]) -> Vec<Vec<usize>> {
    const UNVISITED: usize = usize::MAX;

    let n = edges.len();
    let mut order = vec![UNVISITED; n];
    let mut low = vec![0; n];
    let mut on_stack = vec![false; n];
    let mut stack = Vec::new();
    let mut next = 0;
    let mut found = Vec::new();

    for root in 0..n {
        if order[root] != UNVISITED {
            continue;
        }

        order[root] = next;
        low[root] = next;
        next += 1;
        stack.push(root);
        on_stack[root] = true;
        let mut work = vec![(root, 0)];

        while let Some(&(v, edge)) = work.last() {
            if let Some(&w) = edges[v].get(edge) {
                let top = work.len() - 1;
                work[top].1 += 1;

                if order[w] == UNVISITED {
                    order[w] = next;
                    low[w] = next;
                    next += 1;
                    stack.push(w);
                    on_stack[w] = true;
                    work.push((w, 0));
                } else if on_stack[w] {
                    low[v] = low[v].min(order[w]);
                }
                continue;
            }

            work.pop();
            if let Some(&(parent, _)) = work.last() {
                low[parent] = low[parent].min(low[v]);
            }

            if low[v] == order[v] {
                let mut members = Vec::new();
                while let Some(w) = stack.pop() {
                    on_stack[w] = false;
                    members.push(w);
                    if w == v {
                        break;
                    }
                }
                members.sort_unstable();
                found.push(members);
            }
        }
    }

    found
}

/// Shortest dependency loop from `start` back to itself, staying inside
/// its component. The result starts and ends with `start`.
fn cycle_through(start: usize, edges: &[Vec<usize>], component_of: &[usize]) -> Vec<usize> {
    let mut parent: HashMap<usize, usize> = HashMap::new();
    let mut queue = VecDeque::from([start]);

    while let Some(v) = queue.pop_front() {
        for &w in &edges[v] {
            if component_of[w] != component_of[start] {
                continue;
            }
            if w == start {
                let mut path = vec![v];
                let mut at = v;
                while let Some(&p) = parent.get(&at) {
                    path.push(p);
                    at = p;
                }
                path.reverse();
                path.push(start);
                return path;
            }
            if !parent.contains_key(&w) {
                parent.insert(w, v);
                queue.push_back(w);
            }
        }
    }

    Vec::new()
}
