// ==========================================
// 设备轮换调度系统 - 资历排序与分块
// ==========================================
// 职责: 纯函数核心，不访问数据库
// 输入: 分组内设备快照 + 分类规则 + 评分策略
// 输出: 每台设备的资历/块号/块内序号
// ==========================================
// 排序键:
// 1) seniority 降序
// 2) received_date 升序
// 3) equipment_code 升序
// 4) equipment_id 升序（保证全序）
// ==========================================
// 分块规则（块 1..=total_blocks+1，最后一块为开放块）:
// - 非开放块已满 → 跳过
// - 非开放块已有同一车主 → 跳过
// - 养护承包商 → 跳过所有非开放块
// - 无车主 → 不分块
// ==========================================

use chrono::{DateTime, NaiveDate, Utc};
use std::cmp::Ordering;

use crate::config::ClassRules;
use crate::domain::equipment::{EquipmentRecord, OwnerRef, SeniorityAssignment};
use crate::engine::scoring::SeniorityScoring;

// ==========================================
// RankedUnit - 参与排序的设备
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct RankedUnit {
    pub equipment_id: i64,
    pub owner: Option<OwnerRef>,
    pub seniority: f64,
    pub received_date: NaiveDate,
    pub equipment_code: String,
}

/// 资历排序比较
pub fn compare_units(a: &RankedUnit, b: &RankedUnit) -> Ordering {
    b.seniority
        .total_cmp(&a.seniority)
        .then_with(|| a.received_date.cmp(&b.received_date))
        .then_with(|| a.equipment_code.cmp(&b.equipment_code))
        .then_with(|| a.equipment_id.cmp(&b.equipment_id))
}

// ==========================================
// BlockArena - 分块槽位
// ==========================================
// 每块保存 (owner_id, equipment_id)，下标 0..number_of_blocks
#[derive(Debug, Clone)]
pub struct BlockArena {
    blocks: Vec<Vec<(i64, i64)>>,
    block_size: usize,
}

/// 单台设备的分块结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockPlacement {
    pub equipment_id: i64,
    pub block_number: i32,
    pub number_in_block: i32,
}

impl BlockArena {
    pub fn new(rules: &ClassRules) -> Self {
        Self {
            blocks: vec![Vec::new(); rules.number_of_blocks()],
            block_size: rules.block_size,
        }
    }

    fn is_open_block(&self, index: usize) -> bool {
        index + 1 == self.blocks.len()
    }

    /// 判断设备能否放入指定块
    fn accepts(&self, index: usize, owner: &OwnerRef) -> bool {
        if self.is_open_block(index) {
            return true;
        }

        let block = &self.blocks[index];
        if block.len() >= self.block_size {
            return false;
        }
        if block.iter().any(|(owner_id, _)| *owner_id == owner.owner_id) {
            return false;
        }
        !owner.is_maintenance_contractor
    }

    /// 依次尝试每个块，放入第一个可接受的块
    ///
    /// # 返回
    /// - None: 无车主，不参与分块
    pub fn place(&mut self, equipment_id: i64, owner: Option<&OwnerRef>) -> Option<BlockPlacement> {
        let owner = owner?;

        let index = (0..self.blocks.len()).find(|&i| self.accepts(i, owner))?;
        let block = &mut self.blocks[index];
        block.push((owner.owner_id, equipment_id));

        Some(BlockPlacement {
            equipment_id,
            block_number: index as i32 + 1,
            number_in_block: block.len() as i32,
        })
    }

    /// 各块当前的设备数
    pub fn block_sizes(&self) -> Vec<usize> {
        self.blocks.iter().map(Vec::len).collect()
    }
}

/// 对已排序的设备逐台分块
pub fn assign_blocks(sorted: &[RankedUnit], rules: &ClassRules) -> (Vec<BlockPlacement>, Vec<usize>) {
    let mut arena = BlockArena::new(rules);
    let placements = sorted
        .iter()
        .filter_map(|unit| arena.place(unit.equipment_id, unit.owner.as_ref()))
        .collect();
    (placements, arena.block_sizes())
}

// ==========================================
// rank_group - 分组排名
// ==========================================

/// 分组排名结果
#[derive(Debug, Clone, PartialEq)]
pub struct GroupRanking {
    pub assignments: Vec<SeniorityAssignment>,
    pub approved_count: usize,
    pub cleared_count: usize,
    pub unplaced_count: usize, // 无车主而未分块的 Approved 设备
    pub block_sizes: Vec<usize>,
}

/// 计算分组内全部设备的资历与分块
///
/// # 参数
/// - `records`: 分组内全部设备（任意状态）
/// - `approved_status`: Approved 状态码
/// - `rules`: 分类规则
/// - `scoring`: 评分策略
/// - `now`: 资历生效时间
///
/// # 返回
/// 每台设备一条结果；非 Approved 设备资历/分块被清空
pub fn rank_group(
    records: &[EquipmentRecord],
    approved_status: &str,
    rules: &ClassRules,
    scoring: &dyn SeniorityScoring,
    now: DateTime<Utc>,
) -> GroupRanking {
    let mut assignments = Vec::with_capacity(records.len());
    let mut units = Vec::new();

    for record in records {
        if record.status_code != approved_status {
            assignments.push(SeniorityAssignment::cleared(record.equipment_id, now));
            continue;
        }

        units.push(RankedUnit {
            equipment_id: record.equipment_id,
            owner: record.owner,
            seniority: scoring.score(&record.service, rules.equipment_score),
            received_date: record.received_date,
            equipment_code: record.equipment_code.clone(),
        });
    }

    let cleared_count = assignments.len();
    units.sort_by(compare_units);
    let (placements, block_sizes) = assign_blocks(&units, rules);

    let mut unplaced_count = 0;
    for unit in &units {
        let placement = placements.iter().find(|p| p.equipment_id == unit.equipment_id);
        if placement.is_none() {
            unplaced_count += 1;
        }
        assignments.push(SeniorityAssignment {
            equipment_id: unit.equipment_id,
            seniority: Some(unit.seniority),
            block_number: placement.map(|p| p.block_number),
            number_in_block: placement.map(|p| p.number_in_block),
            seniority_effective_date: now,
        });
    }

    GroupRanking {
        assignments,
        approved_count: units.len(),
        cleared_count,
        unplaced_count,
        block_sizes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::equipment::ServiceHistory;
    use crate::engine::scoring::YearsAndAverageHours;
    use std::collections::{HashMap, HashSet};

    /// 直接以 hours_last_year*3 作为平均工时，years_of_service=0 → 分数即为给定值
    fn unit_record(id: i64, seniority: f64, owner_id: Option<i64>, contractor: bool) -> EquipmentRecord {
        EquipmentRecord {
            equipment_id: id,
            local_area_id: 1,
            equipment_type_id: 1,
            owner: owner_id.map(|owner_id| OwnerRef {
                owner_id,
                is_maintenance_contractor: contractor,
            }),
            status_code: "Approved".to_string(),
            equipment_code: format!("EQ-{:03}", id),
            received_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            service: ServiceHistory {
                years_of_service: 0.0,
                hours_current_year: None,
                hours_last_year: Some(seniority * 3.0),
                hours_two_years_ago: None,
                hours_three_years_ago: None,
            },
            seniority: None,
            block_number: None,
            number_in_block: None,
            seniority_effective_date: None,
        }
    }

    fn rules(block_size: usize, total_blocks: usize) -> ClassRules {
        ClassRules {
            equipment_score: 60,
            block_size,
            total_blocks,
        }
    }

    fn blocks_of(ranking: &GroupRanking) -> HashMap<i64, (i32, i32)> {
        ranking
            .assignments
            .iter()
            .filter_map(|a| Some((a.equipment_id, (a.block_number?, a.number_in_block?))))
            .collect()
    }

    #[test]
    fn test_five_unit_fixture_placement() {
        // A(9,X) B(8,Y) C(7,X) D(6,Z) E(5,Y), 块容量 2, 主块 2 + 开放块
        let records = vec![
            unit_record(1, 9.0, Some(100), false),
            unit_record(2, 8.0, Some(200), false),
            unit_record(3, 7.0, Some(100), false),
            unit_record(4, 6.0, Some(300), false),
            unit_record(5, 5.0, Some(200), false),
        ];

        let ranking = rank_group(&records, "Approved", &rules(2, 2), &YearsAndAverageHours, Utc::now());
        let blocks = blocks_of(&ranking);

        assert_eq!(blocks[&1], (1, 1));
        assert_eq!(blocks[&2], (1, 2));
        assert_eq!(blocks[&3], (2, 1));
        assert_eq!(blocks[&4], (2, 2));
        assert_eq!(blocks[&5], (3, 1));
        assert_eq!(ranking.block_sizes, vec![2, 2, 1]);
    }

    #[test]
    fn test_owner_diversity_skips_to_next_block() {
        let records = vec![
            unit_record(1, 9.0, Some(100), false),
            unit_record(2, 8.0, Some(100), false),
            unit_record(3, 7.0, Some(200), false),
        ];

        let ranking = rank_group(&records, "Approved", &rules(5, 2), &YearsAndAverageHours, Utc::now());
        let blocks = blocks_of(&ranking);

        assert_eq!(blocks[&1], (1, 1));
        assert_eq!(blocks[&2], (2, 1));
        assert_eq!(blocks[&3], (1, 2));
    }

    #[test]
    fn test_open_block_allows_same_owner_beyond_capacity() {
        let records: Vec<_> = (1..=6).map(|i| unit_record(i, 10.0 - i as f64, Some(100), false)).collect();

        let ranking = rank_group(&records, "Approved", &rules(1, 1), &YearsAndAverageHours, Utc::now());
        let blocks = blocks_of(&ranking);

        assert_eq!(blocks[&1], (1, 1));
        for id in 2..=6 {
            assert_eq!(blocks[&id].0, 2);
        }
        assert_eq!(blocks[&6], (2, 5));
    }

    #[test]
    fn test_maintenance_contractor_only_in_open_block() {
        let records = vec![
            unit_record(1, 9.0, Some(100), true),
            unit_record(2, 8.0, Some(200), false),
        ];

        let ranking = rank_group(&records, "Approved", &rules(10, 2), &YearsAndAverageHours, Utc::now());
        let blocks = blocks_of(&ranking);

        assert_eq!(blocks[&1], (3, 1));
        assert_eq!(blocks[&2], (1, 1));
    }

    #[test]
    fn test_ownerless_unit_keeps_seniority_but_no_block() {
        let records = vec![unit_record(1, 9.0, None, false), unit_record(2, 8.0, Some(1), false)];

        let ranking = rank_group(&records, "Approved", &rules(10, 2), &YearsAndAverageHours, Utc::now());
        let ownerless = ranking.assignments.iter().find(|a| a.equipment_id == 1).unwrap();

        assert!(ownerless.seniority.is_some());
        assert_eq!(ownerless.block_number, None);
        assert_eq!(ranking.unplaced_count, 1);
        assert_eq!(blocks_of(&ranking)[&2], (1, 1));
    }

    #[test]
    fn test_non_approved_units_are_cleared() {
        let mut archived = unit_record(1, 9.0, Some(100), false);
        archived.status_code = "Archived".to_string();
        archived.seniority = Some(50.0);
        archived.block_number = Some(1);

        let now = Utc::now();
        let ranking = rank_group(&[archived], "Approved", &rules(10, 2), &YearsAndAverageHours, now);

        assert_eq!(ranking.cleared_count, 1);
        assert_eq!(ranking.assignments, vec![SeniorityAssignment::cleared(1, now)]);
    }

    #[test]
    fn test_ties_break_on_received_date_then_code() {
        let mut a = unit_record(1, 5.0, Some(1), false);
        let mut b = unit_record(2, 5.0, Some(2), false);
        let mut c = unit_record(3, 5.0, Some(3), false);
        a.received_date = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
        b.received_date = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        c.received_date = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        b.equipment_code = "ZZ-1".to_string();
        c.equipment_code = "AA-1".to_string();

        let ranking = rank_group(&[a, b, c], "Approved", &rules(10, 1), &YearsAndAverageHours, Utc::now());
        let blocks = blocks_of(&ranking);

        assert_eq!(blocks[&3], (1, 1));
        assert_eq!(blocks[&2], (1, 2));
        assert_eq!(blocks[&1], (1, 3));
    }

    #[test]
    fn test_ranking_is_deterministic_and_respects_invariants() {
        let records: Vec<_> = (1..=40)
            .map(|i| unit_record(i, ((i * 7) % 11) as f64, Some(i % 6), i % 13 == 0))
            .collect();
        let rules = rules(4, 3);
        let now = Utc::now();

        let first = rank_group(&records, "Approved", &rules, &YearsAndAverageHours, now);
        let mut reversed = records.clone();
        reversed.reverse();
        let second = rank_group(&reversed, "Approved", &rules, &YearsAndAverageHours, now);

        assert_eq!(blocks_of(&first), blocks_of(&second));

        let owners: HashMap<i64, OwnerRef> = records
            .iter()
            .map(|r| (r.equipment_id, r.owner.unwrap()))
            .collect();
        let open_block = rules.open_block_number();
        let mut members: HashMap<i32, Vec<i64>> = HashMap::new();
        for (id, (block, _)) in blocks_of(&first) {
            members.entry(block).or_default().push(id);
        }

        for (block, ids) in &members {
            if *block == open_block {
                continue;
            }
            assert!(ids.len() <= rules.block_size);
            let distinct: HashSet<i64> = ids.iter().map(|id| owners[id].owner_id).collect();
            assert_eq!(distinct.len(), ids.len());
            assert!(ids.iter().all(|id| !owners[id].is_maintenance_contractor));
        }
    }
}
