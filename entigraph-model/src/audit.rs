use crate::entity::Entity;
use entigraph_types::AuditInfo;

impl Entity {
    #[must_use]
    pub fn audit_info(&self) -> Option<&AuditInfo> {
        self.audit.as_ref()
    }

    pub fn audit_info_mut(&mut self) -> Option<&mut AuditInfo> {
        self.audit.as_mut()
    }

    /// Stamps the audit info for a save by `login`: creation and modification
    /// for a new entity, modification only otherwise. An empty login is
    /// ignored.
    pub fn set_audit_info(&mut self, login: &str) {
        if login.is_empty() {
            return;
        }
        let now = self.context.now();
        let is_new = self.is_new();
        let Some(audit) = self.audit.as_mut() else {
            return;
        };
        if is_new {
            audit.stamp_created(login, now);
        } else {
            audit.stamp_modified(login, now);
        }
    }

    /// Takes over the audit info the store returned for this entity, then
    /// commits. `saved` must be of the same type to be copied from.
    pub fn set_unmodified(&mut self, saved: Option<&Entity>) {
        if let Some(saved) = saved.filter(|saved| saved.entity_type() == self.entity_type()) {
            if let (Some(audit), Some(stamps)) = (self.audit.as_mut(), saved.audit.as_ref()) {
                audit.copy_from(stamps);
            }
        }
        self.end_edit();
    }
}
