// ==========================================
// 设备轮换调度系统 - 资历评分规则
// ==========================================
// 载荷格式 (JSON):
// {
//   "EquipmentScore": {"Default": 60, "DumpTruck": 60},
//   "BlockSize":      {"Default": 10, "DumpTruck": 10},
//   "TotalBlocks":    {"Default": 2,  "DumpTruck": 3}
// }
// ==========================================
// 红线: 单次计算内只读; 缺失分类即报错
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::error::{ConfigError, ConfigResult};
use crate::domain::types::EquipmentClass;

const SECTION_EQUIPMENT_SCORE: &str = "EquipmentScore";
const SECTION_BLOCK_SIZE: &str = "BlockSize";
const SECTION_TOTAL_BLOCKS: &str = "TotalBlocks";

// ==========================================
// ScoringRuleSet - 评分规则集
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScoringRuleSet {
    #[serde(rename = "EquipmentScore", default)]
    equipment_score: BTreeMap<String, i32>,

    #[serde(rename = "BlockSize", default)]
    block_size: BTreeMap<String, i32>,

    #[serde(rename = "TotalBlocks", default)]
    total_blocks: BTreeMap<String, i32>,
}

/// 某一分类下的完整规则
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassRules {
    pub equipment_score: i32,
    pub block_size: usize,
    pub total_blocks: usize, // 不含开放块
}

impl ClassRules {
    /// 含开放块在内的块数
    pub fn number_of_blocks(&self) -> usize {
        self.total_blocks + 1
    }

    /// 开放块编号（1 起）
    pub fn open_block_number(&self) -> i32 {
        self.number_of_blocks() as i32
    }
}

impl ScoringRuleSet {
    /// 从 JSON 载荷加载
    pub fn from_json(payload: &str) -> ConfigResult<Self> {
        let rules: ScoringRuleSet = serde_json::from_str(payload)?;
        Ok(rules)
    }

    pub fn to_json(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// 默认规则（新库初始化使用）
    pub fn default_rules() -> Self {
        let mut rules = Self {
            equipment_score: BTreeMap::new(),
            block_size: BTreeMap::new(),
            total_blocks: BTreeMap::new(),
        };
        rules.set(EquipmentClass::Default, 60, 10, 2);
        rules.set(EquipmentClass::DumpTruck, 60, 10, 3);
        rules
    }

    /// 设置某分类的规则
    pub fn set(
        &mut self,
        class: EquipmentClass,
        equipment_score: i32,
        block_size: i32,
        total_blocks: i32,
    ) {
        let key = class.rule_key().to_string();
        self.equipment_score.insert(key.clone(), equipment_score);
        self.block_size.insert(key.clone(), block_size);
        self.total_blocks.insert(key, total_blocks);
    }

    pub fn equipment_score(&self, class: EquipmentClass) -> ConfigResult<i32> {
        lookup(&self.equipment_score, SECTION_EQUIPMENT_SCORE, class)
    }

    pub fn block_size(&self, class: EquipmentClass) -> ConfigResult<i32> {
        lookup(&self.block_size, SECTION_BLOCK_SIZE, class)
    }

    pub fn total_blocks(&self, class: EquipmentClass) -> ConfigResult<i32> {
        lookup(&self.total_blocks, SECTION_TOTAL_BLOCKS, class)
    }

    /// 取某分类的完整规则并校验取值
    ///
    /// # 校验
    /// - block_size > 0
    /// - total_blocks >= 0
    pub fn class_rules(&self, class: EquipmentClass) -> ConfigResult<ClassRules> {
        let equipment_score = self.equipment_score(class)?;
        let block_size = self.block_size(class)?;
        let total_blocks = self.total_blocks(class)?;

        if block_size <= 0 {
            return Err(ConfigError::InvalidRule {
                section: SECTION_BLOCK_SIZE.to_string(),
                class: class.rule_key().to_string(),
                value: block_size,
            });
        }
        if total_blocks < 0 {
            return Err(ConfigError::InvalidRule {
                section: SECTION_TOTAL_BLOCKS.to_string(),
                class: class.rule_key().to_string(),
                value: total_blocks,
            });
        }

        Ok(ClassRules {
            equipment_score,
            block_size: block_size as usize,
            total_blocks: total_blocks as usize,
        })
    }
}

fn lookup(section: &BTreeMap<String, i32>, name: &str, class: EquipmentClass) -> ConfigResult<i32> {
    section
        .get(class.rule_key())
        .copied()
        .ok_or_else(|| ConfigError::MissingRule {
            section: name.to_string(),
            class: class.rule_key().to_string(),
        })
}
