// ==========================================
// 设备轮换调度系统 - 分组上下文
// ==========================================
// 职责: 解析分组对应的区域、设备类型与规则分类
// 红线: 区域/设备类型缺失属于数据完整性错误
// ==========================================

use crate::domain::district::{DistrictEquipmentType, LocalArea};
use crate::domain::types::{EquipmentClass, GroupKey};
use crate::engine::error::{SchedulerError, SchedulerResult};
use crate::engine::repositories::RotationRepositories;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupContext {
    pub group: GroupKey,
    pub local_area: LocalArea,
    pub equipment_type: DistrictEquipmentType,
}

impl GroupContext {
    /// 加载分组上下文
    ///
    /// # 错误
    /// - `DataIntegrity`: 区域或设备类型不存在
    pub fn load(repos: &RotationRepositories, group: GroupKey) -> SchedulerResult<Self> {
        let local_area = repos
            .district_repo
            .find_local_area(group.local_area_id)?
            .ok_or_else(|| {
                SchedulerError::DataIntegrity(format!("区域不存在: {}", group.local_area_id))
            })?;

        let equipment_type = repos
            .district_repo
            .find_equipment_type(group.equipment_type_id)?
            .ok_or_else(|| {
                SchedulerError::DataIntegrity(format!(
                    "设备类型不存在: {}",
                    group.equipment_type_id
                ))
            })?;

        Ok(Self {
            group,
            local_area,
            equipment_type,
        })
    }

    /// 规则查找使用的设备分类
    pub fn equipment_class(&self) -> EquipmentClass {
        self.equipment_type.equipment_class()
    }

    pub fn district_id(&self) -> i64 {
        self.local_area.district_id
    }
}
