use std::sync::Arc;

use chrono::Duration;
use uuid::Uuid;

use crate::clock::Clock;
use crate::errors::{AppError, Resource};
use crate::models::{BandRole, User};
use crate::services::Permissions;
use crate::store::{MemberRemoval, NewBand, NewInviteCode, RoleUpdate, Store, UpdatedBand};
use crate::types::{
    BandDetailResponse, BandMemberInfo, BandResponse, CreateBandPayload,
    CreateInviteCodePayload, InviteCodeResponse, UpdateBandPayload, UpdateMemberRolePayload,
};

#[derive(Clone)]
pub struct BandsService {
    store: Arc<dyn Store>,
    permissions: Permissions,
    clock: Arc<dyn Clock>,
}

impl BandsService {
    pub fn new(store: Arc<dyn Store>, permissions: Permissions, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            permissions,
            clock,
        }
    }

    pub async fn create_band(
        &self,
        user: &User,
        payload: CreateBandPayload,
    ) -> Result<BandResponse, AppError> {
        let (band, membership) = self
            .store
            .create_band(NewBand {
                name: payload.name,
                description: payload.description,
                creator_id: user.id,
                created_at: self.clock.now(),
            })
            .await?;

        Ok(BandResponse::new(&band, membership.role, 1))
    }

    pub async fn my_bands(&self, user: &User) -> Result<Vec<BandResponse>, AppError> {
        let memberships = self.store.bands_for_user(user.id).await?;

        Ok(memberships
            .iter()
            .map(|m| BandResponse::new(&m.band, m.role, m.member_count))
            .collect())
    }

    pub async fn band_detail(
        &self,
        user: &User,
        band_id: i64,
    ) -> Result<BandDetailResponse, AppError> {
        self.permissions.require_band_member(band_id, user.id).await?;

        let band = self
            .store
            .band_by_id(band_id)
            .await?
            .ok_or(AppError::NotFound(Resource::Band))?;
        let members = self.store.members_of_band(band_id).await?;

        Ok(BandDetailResponse::new(&band, &members))
    }

    pub async fn update_band(
        &self,
        user: &User,
        band_id: i64,
        payload: UpdateBandPayload,
    ) -> Result<BandResponse, AppError> {
        self.permissions.require_band_leader(band_id, user.id).await?;

        let band = self
            .store
            .update_band(
                band_id,
                UpdatedBand {
                    name: payload.name,
                    description: payload.description,
                },
            )
            .await?
            .ok_or(AppError::NotFound(Resource::Band))?;

        let member_count = self.store.count_members(band_id).await?;

        Ok(BandResponse::new(&band, BandRole::Leader, member_count))
    }

    pub async fn delete_band(&self, user: &User, band_id: i64) -> Result<(), AppError> {
        self.permissions.require_band_leader(band_id, user.id).await?;

        if !self.store.delete_band(band_id).await? {
            return Err(AppError::NotFound(Resource::Band));
        }

        Ok(())
    }

    pub async fn members(
        &self,
        user: &User,
        band_id: i64,
    ) -> Result<Vec<BandMemberInfo>, AppError> {
        self.permissions.require_band_member(band_id, user.id).await?;

        let members = self.store.members_of_band(band_id).await?;

        Ok(members.iter().map(BandMemberInfo::from).collect())
    }

    pub async fn update_member_role(
        &self,
        user: &User,
        band_id: i64,
        member_user_id: i64,
        payload: UpdateMemberRolePayload,
    ) -> Result<BandMemberInfo, AppError> {
        self.permissions.require_band_leader(band_id, user.id).await?;

        match self
            .store
            .update_member_role(band_id, member_user_id, payload.role)
            .await?
        {
            RoleUpdate::Applied(member) => Ok(BandMemberInfo::from(&member)),
            RoleUpdate::LastLeader => Err(AppError::CannotRemoveLastLeader),
            RoleUpdate::NotFound => Err(AppError::NotFound(Resource::Member)),
        }
    }

    /// Leaders remove anyone; a member may remove only themselves. Either
    /// way the store refuses to orphan the band of its last leader.
    pub async fn remove_member(
        &self,
        user: &User,
        band_id: i64,
        member_user_id: i64,
    ) -> Result<(), AppError> {
        if member_user_id == user.id {
            self.permissions.require_band_member(band_id, user.id).await?;
        } else {
            self.permissions.require_band_leader(band_id, user.id).await?;
        }

        match self.store.remove_member(band_id, member_user_id).await? {
            MemberRemoval::Removed => Ok(()),
            MemberRemoval::LastLeader => Err(AppError::CannotRemoveLastLeader),
            MemberRemoval::NotFound => Err(AppError::NotFound(Resource::Member)),
        }
    }

    pub async fn create_invite_code(
        &self,
        user: &User,
        band_id: i64,
        payload: CreateInviteCodePayload,
    ) -> Result<InviteCodeResponse, AppError> {
        self.permissions.require_band_leader(band_id, user.id).await?;

        let now = self.clock.now();
        let invite = self
            .store
            .create_invite_code(NewInviteCode {
                code: Uuid::new_v4().to_string(),
                band_id,
                role: payload.role,
                expires_at: now + Duration::days(payload.expires_in_days),
                created_at: now,
            })
            .await?;

        Ok(InviteCodeResponse::from(&invite))
    }

    pub async fn invite_codes(
        &self,
        user: &User,
        band_id: i64,
    ) -> Result<Vec<InviteCodeResponse>, AppError> {
        self.permissions.require_band_leader(band_id, user.id).await?;

        let invites = self.store.invite_codes_for_band(band_id).await?;

        Ok(invites.iter().map(InviteCodeResponse::from).collect())
    }

    pub async fn delete_invite_code(
        &self,
        user: &User,
        band_id: i64,
        code: &str,
    ) -> Result<(), AppError> {
        self.permissions.require_band_leader(band_id, user.id).await?;

        let invite = self
            .store
            .invite_code_by_code(code)
            .await?
            .ok_or(AppError::NotFound(Resource::InviteCode))?;

        if invite.band_id != band_id {
            return Err(AppError::Unauthorized);
        }

        if !self.store.delete_invite_code(invite.id).await? {
            return Err(AppError::NotFound(Resource::InviteCode));
        }

        Ok(())
    }
}
