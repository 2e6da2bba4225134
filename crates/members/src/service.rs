//! Member profile workflows with scope and permission checks.

use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use spk_access::{MemberScope, Viewer};
use spk_config::UploadConfig;
use spk_database::{
    DatabaseError, Member, MemberFields, MemberFilter, MemberRepository, MembershipStatus,
    OrgRepository, Page, Paged, PositionFields, Province, ValidationErrors,
};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{MemberError, MemberResult};
use crate::organization::{build_tree, creates_cycle, OrgNode};
use crate::profile::{MemberProfile, MemberView};
use crate::upload::{UploadSlot, UploadStore};
use crate::validation::{normalize_member_fields, validate_member_fields};

/// Optional listing filters supplied by the caller.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MemberQuery {
    pub status: Option<MembershipStatus>,
    pub province_id: Option<i64>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrgChart {
    pub period: Option<String>,
    pub periods: Vec<String>,
    pub positions: Vec<OrgNode>,
}

/// Allocation attempts before a concurrent number clash is reported.
const NUMBER_ATTEMPTS: u32 = 8;

/// `SPK-{province code}-{year}-{sequence:05}`
pub fn member_number(province_code: &str, year: i32, sequence: i64) -> String {
    format!("{}{sequence:05}", member_number_prefix(province_code, year))
}

fn member_number_prefix(province_code: &str, year: i32) -> String {
    format!("SPK-{province_code}-{year}-")
}

#[derive(Clone)]
pub struct MemberService {
    members: MemberRepository,
    positions: OrgRepository,
    uploads: UploadStore,
    public_base_url: String,
}

impl MemberService {
    pub fn new(pool: SqlitePool, uploads: &UploadConfig) -> Self {
        Self {
            members: MemberRepository::new(pool.clone()),
            positions: OrgRepository::new(pool),
            uploads: UploadStore::new(uploads),
            public_base_url: uploads.public_base_url.clone(),
        }
    }

    pub fn view(&self, member: Member) -> MemberView {
        MemberProfile::new(member).view(Utc::now().date_naive(), &self.public_base_url)
    }

    fn is_own(viewer: &Viewer, member: &Member) -> bool {
        member.user_id == Some(viewer.user_id)
    }

    fn in_scope(viewer: &Viewer, member: &Member) -> bool {
        match viewer.member_scope() {
            MemberScope::All => true,
            MemberScope::Province(province_id) => member.province_id == Some(province_id),
            MemberScope::OwnOnly => Self::is_own(viewer, member),
        }
    }

    /// Own profile, or `member.view` with the member inside the viewer's scope.
    pub fn can_see(viewer: &Viewer, member: &Member) -> bool {
        Self::is_own(viewer, member) || (viewer.can("member.view") && Self::in_scope(viewer, member))
    }

    fn ensure_manageable(viewer: &Viewer, member: &Member, key: &str) -> MemberResult<()> {
        viewer.require(key)?;
        if Self::in_scope(viewer, member) {
            Ok(())
        } else {
            Err(MemberError::Forbidden("Anggota berada di luar wilayah Anda".to_string()))
        }
    }

    async fn load(&self, id: i64) -> MemberResult<Member> {
        self.members
            .find_by_id(id)
            .await?
            .ok_or_else(|| MemberError::NotFound(format!("member {id}")))
    }

    pub async fn list(&self, viewer: &Viewer, query: &MemberQuery, page: Page) -> MemberResult<Paged<MemberView>> {
        let mut filter = MemberFilter {
            province_id: query.province_id,
            user_id: None,
            status: query.status,
            search: query.search.clone().filter(|s| !s.trim().is_empty()),
        };

        let scope = if viewer.can("member.view") {
            viewer.member_scope()
        } else {
            MemberScope::OwnOnly
        };
        match scope {
            MemberScope::All => {}
            MemberScope::Province(province_id) => {
                if query.province_id.is_some_and(|requested| requested != province_id) {
                    return Ok(Paged { items: Vec::new(), total: 0 });
                }
                filter.province_id = Some(province_id);
            }
            MemberScope::OwnOnly => filter.user_id = Some(viewer.user_id),
        }

        let members = self.members.list(&filter, page).await?;
        Ok(Paged {
            items: members.items.into_iter().map(|m| self.view(m)).collect(),
            total: members.total,
        })
    }

    pub async fn get(&self, viewer: &Viewer, id: i64) -> MemberResult<MemberView> {
        let member = self.load(id).await?;
        if !Self::can_see(viewer, &member) {
            return Err(MemberError::Forbidden("Anda tidak memiliki akses ke data anggota ini".to_string()));
        }
        Ok(self.view(member))
    }

    /// The viewer's own profile, if one exists.
    pub async fn own_profile(&self, viewer: &Viewer) -> MemberResult<Option<MemberView>> {
        let member = self.members.find_by_user_id(viewer.user_id).await?;
        Ok(member.map(|m| self.view(m)))
    }

    async fn check_fields(
        &self,
        fields: &mut MemberFields,
        except_id: Option<i64>,
    ) -> MemberResult<()> {
        normalize_member_fields(fields);
        let mut errors = validate_member_fields(fields, Utc::now().date_naive());

        if let Some(province_id) = fields.province_id {
            if self.members.find_province(province_id).await?.is_none() {
                errors.add("province_id", "Provinsi tidak ditemukan");
            }
        }
        if let Some(nik) = fields.nik.as_deref() {
            if errors.get("nik").is_none() && self.members.nik_taken(nik, except_id).await? {
                errors.add("nik", "NIK sudah terdaftar");
            }
        }
        errors.into_result().map_err(MemberError::from)
    }

    fn ensure_province_in_scope(viewer: &Viewer, fields: &MemberFields) -> MemberResult<()> {
        match viewer.member_scope() {
            MemberScope::Province(province_id) if fields.province_id != Some(province_id) => {
                let mut errors = ValidationErrors::new();
                errors.add("province_id", "Provinsi harus sesuai wilayah koordinasi Anda");
                Err(errors.into())
            }
            _ => Ok(()),
        }
    }

    /// Creates a profile. Members may register their own profile; anyone
    /// else needs `member.create`.
    pub async fn create(
        &self,
        viewer: &Viewer,
        user_id: Option<i64>,
        mut fields: MemberFields,
    ) -> MemberResult<MemberView> {
        let self_registration = user_id == Some(viewer.user_id);
        if !self_registration {
            viewer.require("member.create")?;
        }

        self.check_fields(&mut fields, None).await?;
        if !self_registration {
            Self::ensure_province_in_scope(viewer, &fields)?;
        }
        if let Some(user_id) = user_id {
            if self.members.find_by_user_id(user_id).await?.is_some() {
                return Err(MemberError::Duplicate(format!("member profile for user {user_id}")));
            }
        }

        let member = self.members.create(user_id, &fields).await?;
        Ok(self.view(member))
    }

    pub async fn update(&self, viewer: &Viewer, id: i64, mut fields: MemberFields) -> MemberResult<MemberView> {
        let member = self.load(id).await?;
        let own = Self::is_own(viewer, &member);
        if !own {
            Self::ensure_manageable(viewer, &member, "member.edit")?;
        }

        self.check_fields(&mut fields, Some(id)).await?;
        if !own {
            Self::ensure_province_in_scope(viewer, &fields)?;
        }

        let member = self.members.update(id, &fields).await?;
        Ok(self.view(member))
    }

    pub async fn delete(&self, viewer: &Viewer, id: i64) -> MemberResult<()> {
        let member = self.load(id).await?;
        Self::ensure_manageable(viewer, &member, "member.delete")?;

        self.members.delete(id).await?;
        for path in [member.photo_path, member.id_card_path].into_iter().flatten() {
            self.uploads.remove(&path).await;
        }
        Ok(())
    }

    /// Activates a pending registration and issues its member number.
    pub async fn verify(&self, viewer: &Viewer, id: i64) -> MemberResult<MemberView> {
        let member = self.load(id).await?;
        Self::ensure_manageable(viewer, &member, "member.verify")?;
        if member.status != MembershipStatus::Pending {
            return Err(MemberError::InvalidState(
                "Hanya pendaftaran berstatus menunggu yang dapat diverifikasi".to_string(),
            ));
        }

        let province = match member.province_id {
            Some(province_id) => self.members.find_province(province_id).await?,
            None => None,
        };
        let Some(Province { code, .. }) = province else {
            let mut errors = ValidationErrors::new();
            errors.add("province_id", "Provinsi wajib diisi sebelum verifikasi");
            return Err(errors.into());
        };

        let year = Utc::now().year();
        let prefix = member_number_prefix(&code, year);
        let mut attempt = 1;
        let number = loop {
            let sequence = self.members.last_member_sequence(&prefix).await? + 1;
            let number = member_number(&code, year, sequence);
            match self.members.mark_verified(id, &number).await {
                Ok(true) => break number,
                Ok(false) => {
                    return Err(MemberError::InvalidState(
                        "Pendaftaran sudah diproses oleh pengurus lain".to_string(),
                    ))
                }
                Err(DatabaseError::Duplicate(_)) if attempt < NUMBER_ATTEMPTS => {
                    debug!(%number, attempt, "member number taken concurrently, retrying");
                    attempt += 1;
                }
                Err(error) => return Err(error.into()),
            }
        };
        info!(member_id = id, verified_by = viewer.user_id, member_number = %number, "registration verified");

        self.load(id).await.map(|m| self.view(m))
    }

    pub async fn reject(&self, viewer: &Viewer, id: i64) -> MemberResult<MemberView> {
        let member = self.load(id).await?;
        Self::ensure_manageable(viewer, &member, "member.verify")?;
        if member.status != MembershipStatus::Pending {
            return Err(MemberError::InvalidState(
                "Hanya pendaftaran berstatus menunggu yang dapat ditolak".to_string(),
            ));
        }

        self.members.set_status(id, MembershipStatus::Rejected).await?;
        self.load(id).await.map(|m| self.view(m))
    }

    /// Stores a photo or ID card scan, replacing the previous file.
    pub async fn upload(
        &self,
        viewer: &Viewer,
        id: i64,
        slot: UploadSlot,
        bytes: &[u8],
    ) -> MemberResult<MemberView> {
        let member = self.load(id).await?;
        if !Self::is_own(viewer, &member) {
            Self::ensure_manageable(viewer, &member, "member.edit")?;
        }

        let path = self.uploads.save(slot, id, bytes).await?;
        let previous = match slot {
            UploadSlot::Photo => {
                self.members.set_photo_path(id, &path).await?;
                member.photo_path
            }
            UploadSlot::IdCard => {
                self.members.set_id_card_path(id, &path).await?;
                member.id_card_path
            }
        };
        if let Some(previous) = previous {
            self.uploads.remove(&previous).await;
        }

        self.load(id).await.map(|m| self.view(m))
    }

    pub async fn provinces(&self) -> MemberResult<Vec<Province>> {
        Ok(self.members.provinces().await?)
    }

    /// Chart for `period`, or for the newest known period.
    pub async fn organization(&self, period: Option<&str>) -> MemberResult<OrgChart> {
        let periods = self.positions.periods().await?;
        let period = period
            .map(str::to_string)
            .or_else(|| periods.first().cloned());

        let positions = match period.as_deref() {
            Some(period) => build_tree(self.positions.positions(period).await?),
            None => Vec::new(),
        };
        Ok(OrgChart { period, periods, positions })
    }

    async fn check_position(&self, fields: &PositionFields, id: Option<i64>) -> MemberResult<()> {
        let mut errors = ValidationErrors::new();
        errors.required("title", &fields.title, "Nama jabatan");
        errors.max_len("title", &fields.title, 100, "Nama jabatan");
        errors.required("period", &fields.period, "Periode");

        if let Some(parent_id) = fields.parent_id {
            match self.positions.find_by_id(parent_id).await? {
                None => errors.add("parent_id", "Jabatan induk tidak ditemukan"),
                Some(parent) if parent.period != fields.period.trim() => {
                    errors.add("parent_id", "Jabatan induk harus berada pada periode yang sama")
                }
                Some(_) => {
                    if let Some(id) = id {
                        let siblings = self.positions.positions(fields.period.trim()).await?;
                        if creates_cycle(&siblings, id, parent_id) {
                            errors.add("parent_id", "Jabatan induk tidak boleh membentuk lingkaran");
                        }
                    }
                }
            }
        }
        if let Some(member_id) = fields.member_id {
            if self.members.find_by_id(member_id).await?.is_none() {
                errors.add("member_id", "Anggota tidak ditemukan");
            }
        }
        errors.into_result().map_err(MemberError::from)
    }

    pub async fn create_position(&self, viewer: &Viewer, fields: &PositionFields) -> MemberResult<OrgNode> {
        viewer.require("org.manage")?;
        self.check_position(fields, None).await?;
        let position = self.positions.create(fields).await?;
        Ok(OrgNode { position, children: Vec::new() })
    }

    pub async fn update_position(
        &self,
        viewer: &Viewer,
        id: i64,
        fields: &PositionFields,
    ) -> MemberResult<OrgNode> {
        viewer.require("org.manage")?;
        if self.positions.find_by_id(id).await?.is_none() {
            return Err(MemberError::NotFound(format!("org position {id}")));
        }
        self.check_position(fields, Some(id)).await?;
        let position = self.positions.update(id, fields).await?;
        Ok(OrgNode { position, children: Vec::new() })
    }

    /// Deleting a position removes its subordinate positions too.
    pub async fn delete_position(&self, viewer: &Viewer, id: i64) -> MemberResult<()> {
        viewer.require("org.manage")?;
        if !self.positions.delete(id).await? {
            return Err(MemberError::NotFound(format!("org position {id}")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn member_numbers_are_zero_padded() {
        assert_eq!(member_number("32", 2026, 1), "SPK-32-2026-00001");
        assert_eq!(member_number("91", 2025, 123_456), "SPK-91-2025-123456");
    }
}
