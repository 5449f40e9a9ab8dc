//! Pose groups: mutually exclusive part sets with a short opacity cross-fade.
//!
//! Switching is latched: [`Pose::set_pose`] records the request and the next
//! [`Pose::update`] starts the fade at its `now_ms`. Opacities are written to the part
//! table of the [`ParameterStore`]; linked parts mirror their owner.

use hashbrown::HashMap;
use log::{debug, warn};

use crate::assets::PoseData;
use crate::config::PoseConfig;
use crate::error::ModelError;
use crate::params::ParameterStore;

#[derive(Clone, Debug)]
struct PosePart {
    id: String,
    links: Vec<String>,
}

#[derive(Clone, Copy, Debug)]
struct PoseFade {
    from: usize,
    to: usize,
    from_opacity: f32,
    to_opacity: f32,
    start_ms: u64,
}

#[derive(Clone, Debug)]
pub struct PoseGroup {
    name: String,
    parts: Vec<PosePart>,
    active: usize,
    previous: Option<usize>,
    pending: Option<usize>,
    fade: Option<PoseFade>,
}

impl PoseGroup {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn part_ids(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|p| p.id.as_str())
    }

    /// The selected part, including a selection not yet picked up by an update.
    pub fn active_index(&self) -> usize {
        self.pending.unwrap_or(self.active)
    }

    pub fn previous_index(&self) -> Option<usize> {
        self.previous
    }

    #[inline]
    pub fn is_fading(&self) -> bool {
        self.fade.is_some()
    }

    fn opacity(&self, params: &ParameterStore, idx: usize) -> f32 {
        params.part_opacity(&self.parts[idx].id).unwrap_or(0.0)
    }

    fn write(&self, params: &mut ParameterStore, idx: usize, opacity: f32) {
        params.set_part_opacity(&self.parts[idx].id, opacity);
    }

    fn show_only_active(&self, params: &mut ParameterStore) {
        for idx in 0..self.parts.len() {
            let opacity = if idx == self.active { 1.0 } else { 0.0 };
            self.write(params, idx, opacity);
        }
    }

    fn begin_pending(&mut self, params: &mut ParameterStore, now_ms: u64) {
        let Some(to) = self.pending.take() else {
            return;
        };
        let from = self.active;
        if let Some(old) = self.fade.take() {
            if old.from != to {
                self.write(params, old.from, 0.0);
            }
        }
        self.fade = Some(PoseFade {
            from,
            to,
            from_opacity: self.opacity(params, from),
            to_opacity: self.opacity(params, to),
            start_ms: now_ms,
        });
        self.previous = Some(from);
        self.active = to;
    }

    fn advance(&mut self, params: &mut ParameterStore, now_ms: u64, fade_ms: f32) {
        let Some(f) = self.fade else {
            return;
        };
        let t = if fade_ms <= 0.0 {
            1.0
        } else {
            (now_ms.saturating_sub(f.start_ms) as f32 / fade_ms).clamp(0.0, 1.0)
        };
        if t >= 1.0 {
            self.write(params, f.from, 0.0);
            self.write(params, f.to, 1.0);
            self.fade = None;
        } else {
            self.write(params, f.from, f.from_opacity * (1.0 - t));
            self.write(params, f.to, f.to_opacity + (1.0 - f.to_opacity) * t);
        }
    }

    fn copy_links(&self, params: &mut ParameterStore) {
        for part in &self.parts {
            if part.links.is_empty() {
                continue;
            }
            let opacity = params.part_opacity(&part.id).unwrap_or(0.0);
            for link in &part.links {
                params.set_part_opacity(link, opacity);
            }
        }
    }
}

#[derive(Clone, Debug)]
pub struct Pose {
    groups: Vec<PoseGroup>,
    group_index: HashMap<String, usize>,
    fade_ms: f32,
    initialized: bool,
}

impl Pose {
    /// Build pose groups, checking every part and link against the model's part table.
    /// The first part of each group starts active.
    pub fn from_data(
        data: PoseData,
        cfg: &PoseConfig,
        params: &ParameterStore,
    ) -> Result<Self, ModelError> {
        let fade_ms = data.fade_ms.unwrap_or(cfg.fade_ms);
        if !fade_ms.is_finite() || fade_ms < 0.0 {
            return Err(ModelError::invalid(format!(
                "pose fade_ms must be finite and >= 0, got {fade_ms}"
            )));
        }

        let mut groups = Vec::with_capacity(data.parts_visible.len());
        let mut group_index = HashMap::new();
        for g in data.parts_visible {
            let Some(first) = g.group.first() else {
                warn!("pose: skipping empty group {:?}", g.name);
                continue;
            };
            let name = g.name.clone().unwrap_or_else(|| first.id.clone());
            if group_index.contains_key(&name) {
                return Err(ModelError::invalid(format!(
                    "duplicate pose group '{name}'"
                )));
            }

            let mut parts = Vec::with_capacity(g.group.len());
            for p in g.group {
                if let Some(id) = std::iter::once(&p.id)
                    .chain(p.link.iter())
                    .find(|id| !params.contains_part(id))
                {
                    return Err(ModelError::UnknownPart {
                        asset: format!("pose group '{name}'"),
                        id: id.clone(),
                    });
                }
                parts.push(PosePart {
                    id: p.id,
                    links: p.link,
                });
            }

            group_index.insert(name.clone(), groups.len());
            groups.push(PoseGroup {
                name,
                parts,
                active: 0,
                previous: None,
                pending: None,
                fade: None,
            });
        }
        if groups.is_empty() {
            warn!("pose: no part groups, pose switching disabled");
        }
        debug!("pose: {} group(s), fade {fade_ms} ms", groups.len());

        Ok(Self {
            groups,
            group_index,
            fade_ms,
            initialized: false,
        })
    }

    pub fn groups(&self) -> &[PoseGroup] {
        &self.groups
    }

    pub fn group(&self, name: &str) -> Option<&PoseGroup> {
        self.group_index.get(name).map(|&i| &self.groups[i])
    }

    #[inline]
    pub fn fade_ms(&self) -> f32 {
        self.fade_ms
    }

    /// Select part `part_index` of `group`. The fade starts at the next update.
    pub fn set_pose(&mut self, group: &str, part_index: usize) -> Result<(), ModelError> {
        let gi = *self
            .group_index
            .get(group)
            .ok_or_else(|| ModelError::not_found("pose group", group))?;
        let g = &mut self.groups[gi];
        if part_index >= g.parts.len() {
            return Err(ModelError::not_found(
                "pose part",
                format!("{group}[{part_index}]"),
            ));
        }
        if part_index == g.active {
            g.pending = None;
        } else if g.pending != Some(part_index) {
            debug!("pose: {group} -> {}", g.parts[part_index].id);
            g.pending = Some(part_index);
        }
        Ok(())
    }

    /// Select the group member `part_id`.
    pub fn set_pose_by_part(&mut self, part_id: &str) -> Result<(), ModelError> {
        let found = self.groups.iter().find_map(|g| {
            g.parts
                .iter()
                .position(|p| p.id == part_id)
                .map(|idx| (g.name.clone(), idx))
        });
        match found {
            Some((group, idx)) => self.set_pose(&group, idx),
            None => Err(ModelError::not_found("pose part", part_id)),
        }
    }

    /// Advance fades to `now_ms` and write part opacities.
    pub fn update(&mut self, params: &mut ParameterStore, now_ms: u64) {
        if !self.initialized {
            for g in &self.groups {
                g.show_only_active(params);
            }
            self.initialized = true;
        }
        for g in &mut self.groups {
            g.begin_pending(params, now_ms);
            g.advance(params, now_ms, self.fade_ms);
            g.copy_links(params);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{PoseGroupData, PosePartData};
    use crate::params::PartDef;

    fn params() -> ParameterStore {
        ParameterStore::default()
            .with_parts(&[
                PartDef::new("ARM_A"),
                PartDef::new("ARM_B"),
                PartDef::new("ARM_C"),
                PartDef::new("SLEEVE_A"),
            ])
            .unwrap()
    }

    fn pose(p: &ParameterStore) -> Pose {
        let data = PoseData {
            fade_ms: Some(100.0),
            parts_visible: vec![PoseGroupData {
                name: Some("arms".into()),
                group: vec![
                    PosePartData {
                        id: "ARM_A".into(),
                        link: vec!["SLEEVE_A".into()],
                    },
                    PosePartData {
                        id: "ARM_B".into(),
                        link: vec![],
                    },
                    PosePartData {
                        id: "ARM_C".into(),
                        link: vec![],
                    },
                ],
            }],
        };
        Pose::from_data(data, &PoseConfig::default(), p).unwrap()
    }

    #[test]
    fn first_update_shows_first_part() {
        let mut p = params();
        let mut pose = pose(&p);
        pose.update(&mut p, 0);
        assert_eq!(p.part_opacity("ARM_A"), Some(1.0));
        assert_eq!(p.part_opacity("ARM_B"), Some(0.0));
        assert_eq!(p.part_opacity("SLEEVE_A"), Some(1.0));
    }

    #[test]
    fn fade_is_latched_and_linear() {
        let mut p = params();
        let mut pose = pose(&p);
        pose.update(&mut p, 0);
        pose.set_pose("arms", 1).unwrap();
        pose.update(&mut p, 1000);
        assert_eq!(p.part_opacity("ARM_B"), Some(0.0));
        pose.update(&mut p, 1050);
        assert_eq!(p.part_opacity("ARM_A"), Some(0.5));
        assert_eq!(p.part_opacity("ARM_B"), Some(0.5));
        assert_eq!(p.part_opacity("SLEEVE_A"), Some(0.5));
        pose.update(&mut p, 1100);
        assert_eq!(p.part_opacity("ARM_A"), Some(0.0));
        assert_eq!(p.part_opacity("ARM_B"), Some(1.0));
        assert!(!pose.group("arms").unwrap().is_fading());
    }

    #[test]
    fn switch_mid_fade_snaps_older_part() {
        let mut p = params();
        let mut pose = pose(&p);
        pose.update(&mut p, 0);
        pose.set_pose("arms", 1).unwrap();
        pose.update(&mut p, 0);
        pose.update(&mut p, 50);
        pose.set_pose("arms", 2).unwrap();
        pose.update(&mut p, 50);
        assert_eq!(p.part_opacity("ARM_A"), Some(0.0));
        assert_eq!(p.part_opacity("ARM_B"), Some(0.5));
        assert_eq!(p.part_opacity("ARM_C"), Some(0.0));
        pose.update(&mut p, 100);
        assert_eq!(p.part_opacity("ARM_B"), Some(0.25));
        assert_eq!(p.part_opacity("ARM_C"), Some(0.5));
    }

    #[test]
    fn unknown_lookups_are_not_found() {
        let p = params();
        let mut pose = pose(&p);
        assert!(matches!(
            pose.set_pose("legs", 0),
            Err(ModelError::NotFound { .. })
        ));
        assert!(matches!(
            pose.set_pose("arms", 3),
            Err(ModelError::NotFound { .. })
        ));
        assert!(pose.set_pose_by_part("ARM_C").is_ok());
        assert_eq!(pose.group("arms").unwrap().active_index(), 2);
    }

    #[test]
    fn unknown_part_fails_to_load() {
        let p = params();
        let data = PoseData {
            fade_ms: None,
            parts_visible: vec![PoseGroupData {
                name: None,
                group: vec![PosePartData {
                    id: "LEG_A".into(),
                    link: vec![],
                }],
            }],
        };
        assert!(matches!(
            Pose::from_data(data, &PoseConfig::default(), &p),
            Err(ModelError::UnknownPart { .. })
        ));
    }
}
