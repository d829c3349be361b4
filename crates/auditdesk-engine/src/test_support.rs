#[cfg(test)]
pub(crate) mod helpers {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
    use std::time::Duration;

    use auditdesk_core::cell::{CellValue, RowRecord};
    use auditdesk_core::entities::{Audit, AuditItem, EvidenceRef, Template};
    use auditdesk_core::enums::AuditStatus;
    use auditdesk_core::errors::{CoreError, CoreResult};
    use auditdesk_core::identity::Actor;
    use auditdesk_core::repository::{
        AuditRepository, NewAudit, NewAuditItem, NewEvidence, NewTemplate,
    };
    use auditdesk_core::updates::ItemChanges;
    use chrono::Utc;

    /// In-process record store with switches for failure injection and
    /// write latency, and counters for asserting write coalescing.
    #[derive(Default)]
    pub struct MockRepo {
        state: Mutex<MockState>,
        fail_writes: AtomicBool,
        fail_item_inserts: AtomicBool,
        write_delay_ms: AtomicU64,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    #[derive(Default)]
    struct MockState {
        next_id: u32,
        templates: Vec<Template>,
        audits: Vec<Audit>,
        items: Vec<AuditItem>,
        writes: Vec<(String, ItemChanges)>,
    }

    impl MockState {
        fn id(&mut self, prefix: &str) -> String {
            self.next_id += 1;
            format!("{prefix}-{:08x}", self.next_id)
        }

        fn editable_audit_of(&self, item_id: &str) -> CoreResult<usize> {
            let item = self
                .items
                .iter()
                .position(|i| i.id == item_id)
                .ok_or_else(|| CoreError::not_found("item", item_id))?;
            let audit = self
                .audits
                .iter()
                .find(|a| a.id == self.items[item].audit_id)
                .ok_or_else(|| CoreError::not_found("audit", &self.items[item].audit_id))?;
            if !audit.is_editable() {
                return Err(CoreError::Locked {
                    entity_type: "audit".into(),
                    id: audit.id.clone(),
                    status: audit.status.as_str().into(),
                });
            }
            Ok(item)
        }
    }

    pub fn question_row(n: u32) -> RowRecord {
        [
            ("Question", CellValue::from(format!("Question {n}"))),
            ("Category", CellValue::from("General")),
        ]
        .into_iter()
        .collect()
    }

    impl MockRepo {
        fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
            self.state.lock().unwrap()
        }

        /// Template, in-progress audit owned by `auditor` and `rows` items.
        pub async fn seed(&self, auditor: &str, rows: u32) -> (Audit, Vec<AuditItem>) {
            let template = self
                .insert_template(NewTemplate {
                    title: "seeded".into(),
                    description: None,
                    structure: (0..rows).map(question_row).collect(),
                    created_by: auditor.into(),
                })
                .await
                .unwrap();
            let audit = self
                .insert_audit(NewAudit {
                    template_id: template.id,
                    title: "Audit - seeded".into(),
                    auditor_id: auditor.into(),
                })
                .await
                .unwrap();
            let items = self
                .insert_items(
                    &audit.id,
                    (0..rows)
                        .map(|n| NewAuditItem {
                            row_index: n,
                            original_data: question_row(n),
                        })
                        .collect(),
                    &Actor::new(auditor),
                )
                .await
                .unwrap();
            (audit, items)
        }

        pub fn fail_writes(&self, fail: bool) {
            self.fail_writes.store(fail, Ordering::SeqCst);
        }

        /// Make `insert_items` fail, as a backend dropping mid-import would.
        pub fn fail_item_inserts(&self, fail: bool) {
            self.fail_item_inserts.store(fail, Ordering::SeqCst);
        }

        pub fn set_write_delay(&self, delay: Duration) {
            self.write_delay_ms
                .store(u64::try_from(delay.as_millis()).unwrap(), Ordering::SeqCst);
        }

        /// Force an audit's status, as the review workflow would.
        pub fn set_status(&self, audit_id: &str, status: AuditStatus) {
            let mut state = self.lock();
            let audit = state.audits.iter_mut().find(|a| a.id == audit_id).unwrap();
            audit.status = status;
        }

        /// Successful item writes, in commit order.
        pub fn writes(&self) -> Vec<(String, ItemChanges)> {
            self.lock().writes.clone()
        }

        pub fn write_count(&self) -> usize {
            self.lock().writes.len()
        }

        pub fn max_in_flight(&self) -> usize {
            self.max_in_flight.load(Ordering::SeqCst)
        }

        pub fn item(&self, item_id: &str) -> AuditItem {
            self.lock()
                .items
                .iter()
                .find(|i| i.id == item_id)
                .cloned()
                .unwrap()
        }

        pub fn template_count(&self) -> usize {
            self.lock().templates.len()
        }
    }

    impl AuditRepository for MockRepo {
        async fn insert_template(&self, input: NewTemplate) -> CoreResult<Template> {
            let mut state = self.lock();
            let template = Template {
                id: state.id("tpl"),
                title: input.title,
                description: input.description,
                structure: input.structure,
                created_by: input.created_by,
                created_at: Utc::now(),
            };
            state.templates.push(template.clone());
            Ok(template)
        }

        async fn insert_audit(&self, input: NewAudit) -> CoreResult<Audit> {
            let mut state = self.lock();
            let now = Utc::now();
            let audit = Audit {
                id: state.id("aud"),
                template_id: input.template_id,
                title: input.title,
                auditor_id: input.auditor_id,
                status: AuditStatus::InProgress,
                created_at: now,
                updated_at: now,
                submitted_at: None,
            };
            state.audits.push(audit.clone());
            Ok(audit)
        }

        async fn insert_items(
            &self,
            audit_id: &str,
            items: Vec<NewAuditItem>,
            actor: &Actor,
        ) -> CoreResult<Vec<AuditItem>> {
            if self.fail_item_inserts.load(Ordering::SeqCst) {
                return Err(CoreError::Backend("injected items failure".into()));
            }
            let mut state = self.lock();
            if !state.audits.iter().any(|a| a.id == audit_id) {
                return Err(CoreError::not_found("audit", audit_id));
            }
            let mut created = Vec::with_capacity(items.len());
            for input in items {
                let item = AuditItem {
                    id: state.id("itm"),
                    audit_id: audit_id.into(),
                    row_index: input.row_index,
                    original_data: input.original_data,
                    audit_details: String::new(),
                    observation: String::new(),
                    remark: None,
                    evidence: Vec::new(),
                    last_modified_by: Some(actor.id().into()),
                    updated_at: Utc::now(),
                };
                state.items.push(item.clone());
                created.push(item);
            }
            created.sort_by_key(|i| i.row_index);
            Ok(created)
        }

        async fn discard_import(
            &self,
            template_id: &str,
            audit_id: Option<&str>,
            _actor: &Actor,
        ) -> CoreResult<()> {
            let mut state = self.lock();
            if let Some(audit_id) = audit_id {
                state.items.retain(|i| i.audit_id != audit_id);
                state.audits.retain(|a| a.id != audit_id);
            }
            if !state.audits.iter().any(|a| a.template_id == template_id) {
                state.templates.retain(|t| t.id != template_id);
            }
            Ok(())
        }

        async fn get_audit(&self, audit_id: &str) -> CoreResult<Audit> {
            self.lock()
                .audits
                .iter()
                .find(|a| a.id == audit_id)
                .cloned()
                .ok_or_else(|| CoreError::not_found("audit", audit_id))
        }

        async fn latest_audit_for_auditor(&self, auditor_id: &str) -> CoreResult<Option<Audit>> {
            Ok(self
                .lock()
                .audits
                .iter()
                .rev()
                .find(|a| a.auditor_id == auditor_id)
                .cloned())
        }

        async fn list_items(&self, audit_id: &str) -> CoreResult<Vec<AuditItem>> {
            let mut items: Vec<AuditItem> = self
                .lock()
                .items
                .iter()
                .filter(|i| i.audit_id == audit_id)
                .cloned()
                .collect();
            items.sort_by_key(|i| i.row_index);
            Ok(items)
        }

        async fn update_item_fields(
            &self,
            item_id: &str,
            changes: &ItemChanges,
            actor: &Actor,
        ) -> CoreResult<()> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            let delay = self.write_delay_ms.load(Ordering::SeqCst);
            if delay > 0 {
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }

            let result = if self.fail_writes.load(Ordering::SeqCst) {
                Err(CoreError::Backend("injected write failure".into()))
            } else {
                let mut guard = self.lock();
                let state = &mut *guard;
                state.editable_audit_of(item_id).map(|idx| {
                    let item = &mut state.items[idx];
                    item.apply(changes);
                    item.last_modified_by = Some(actor.id().into());
                    item.updated_at = Utc::now();
                    state.writes.push((item_id.into(), changes.clone()));
                })
            };
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            result
        }

        async fn insert_evidence(
            &self,
            item_id: &str,
            input: NewEvidence,
            actor: &Actor,
        ) -> CoreResult<EvidenceRef> {
            let mut state = self.lock();
            let idx = state.editable_audit_of(item_id)?;
            let evidence = EvidenceRef {
                id: state.id("evd"),
                item_id: item_id.into(),
                file_name: input.file_name,
                file_path: input.file_path,
                file_type: input.file_type,
                uploaded_by: Some(actor.id().into()),
                created_at: Utc::now(),
            };
            state.items[idx].evidence.push(evidence.clone());
            Ok(evidence)
        }

        async fn delete_evidence(&self, evidence_id: &str, _actor: &Actor) -> CoreResult<()> {
            let mut state = self.lock();
            let item_id = state
                .items
                .iter()
                .find(|i| i.evidence.iter().any(|e| e.id == evidence_id))
                .map(|i| i.id.clone())
                .ok_or_else(|| CoreError::not_found("evidence", evidence_id))?;
            let idx = state.editable_audit_of(&item_id)?;
            state.items[idx].evidence.retain(|e| e.id != evidence_id);
            Ok(())
        }

        async fn update_audit_status(
            &self,
            audit_id: &str,
            from: AuditStatus,
            to: AuditStatus,
            _actor: &Actor,
        ) -> CoreResult<Audit> {
            let mut state = self.lock();
            let audit = state
                .audits
                .iter_mut()
                .find(|a| a.id == audit_id)
                .ok_or_else(|| CoreError::not_found("audit", audit_id))?;
            if audit.status != from || !from.can_transition_to(to) {
                return Err(CoreError::InvalidTransition {
                    entity_type: "audit".into(),
                    id: audit_id.into(),
                    from: audit.status.as_str().into(),
                    to: to.as_str().into(),
                });
            }
            audit.status = to;
            audit.updated_at = Utc::now();
            if to == AuditStatus::Submitted {
                audit.submitted_at = Some(audit.updated_at);
            }
            Ok(audit.clone())
        }
    }
}
