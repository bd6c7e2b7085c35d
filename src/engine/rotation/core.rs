// ==========================================
// 设备轮换调度系统 - 轮换名单排序核心
// ==========================================
// 纯函数: 规范顺序 + 历史询问轨迹 → 新名单顺序
// ==========================================
// 步骤:
// 1) 规范顺序: block_number 升序, number_in_block 升序（排除在租设备）
// 2) 每块起点: 该块上次被询问设备的后继（块内循环）；未询问过则为块首
// 3) 重排: 每块从起点开始，块内起点之前的设备追加到块尾
// 4) sort_order 重新编号为 1..n
// ==========================================

use std::collections::{BTreeSet, HashSet};

use crate::domain::equipment::EquipmentRecord;
use crate::domain::rotation::{RotationCandidate, RotationHistoryEntry, RotationList};

/// 某一块的起始位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockStart {
    pub block_number: i32,
    pub start_index: usize, // 在候选列表中的下标
    pub resumed: bool,      // true: 接续上次询问; false: 块首
}

/// 由已分块设备生成规范候选列表
///
/// # 参数
/// - `ranked`: 已按 (block_number, number_in_block) 排好序的设备
/// - `hired`: 在租设备ID
pub fn canonical_candidates(ranked: &[EquipmentRecord], hired: &HashSet<i64>) -> Vec<RotationCandidate> {
    ranked
        .iter()
        .filter(|r| !hired.contains(&r.equipment_id))
        .filter_map(|r| {
            Some(RotationCandidate {
                equipment_id: r.equipment_id,
                block_number: r.block_number?,
                seniority: r.seniority,
                sort_order: 0,
            })
        })
        .enumerate()
        .map(|(i, mut c)| {
            c.sort_order = i as i32 + 1;
            c
        })
        .collect()
}

/// 块内成员下标（保持规范顺序）
fn block_members(candidates: &[RotationCandidate], block_number: i32) -> Vec<usize> {
    candidates
        .iter()
        .enumerate()
        .filter(|(_, c)| c.block_number == block_number)
        .map(|(i, _)| i)
        .collect()
}

/// 块内上次被询问设备的位置（在 members 中的下标）
///
/// 历史按 请求ID 降序、sort_order 降序排列；取第一条
/// 设备仍在该块中的记录，已不在名单或已换块的记录跳过
fn last_asked_position(
    candidates: &[RotationCandidate],
    members: &[usize],
    history: &[RotationHistoryEntry],
) -> Option<usize> {
    history.iter().find_map(|entry| {
        members
            .iter()
            .position(|&i| candidates[i].equipment_id == entry.equipment_id)
    })
}

/// 查找某块上次被询问的设备
///
/// # 返回
/// 该设备在候选列表中的下标
pub fn last_asked_in_block(
    candidates: &[RotationCandidate],
    history: &[RotationHistoryEntry],
    block_number: i32,
) -> Option<usize> {
    let members = block_members(candidates, block_number);
    last_asked_position(candidates, &members, history).map(|pos| members[pos])
}

/// 计算每块的起点
///
/// 按块号升序返回；块内上次询问设备为块尾时回到块首
pub fn resolve_start_points(
    candidates: &[RotationCandidate],
    history: &[RotationHistoryEntry],
) -> Vec<BlockStart> {
    let blocks: BTreeSet<i32> = candidates.iter().map(|c| c.block_number).collect();
    let mut starts = Vec::with_capacity(blocks.len());

    for block_number in blocks {
        let members = block_members(candidates, block_number);
        let Some(&first) = members.first() else {
            continue;
        };

        let start = match last_asked_position(candidates, &members, history) {
            Some(pos) => BlockStart {
                block_number,
                start_index: members[(pos + 1) % members.len()],
                resumed: true,
            },
            None => BlockStart {
                block_number,
                start_index: first,
                resumed: false,
            },
        };
        starts.push(start);
    }

    starts
}

/// 按起点重排候选并重新编号
pub fn relinearize(candidates: &[RotationCandidate], starts: &[BlockStart]) -> Vec<RotationCandidate> {
    let mut ordered = Vec::with_capacity(candidates.len());

    for start in starts {
        let members = block_members(candidates, start.block_number);
        let pivot = members
            .iter()
            .position(|&i| i == start.start_index)
            .unwrap_or(0);

        let (head, tail) = members.split_at(pivot);
        ordered.extend(tail.iter().chain(head).map(|&i| candidates[i].clone()));
    }

    for (i, c) in ordered.iter_mut().enumerate() {
        c.sort_order = i as i32 + 1;
    }
    ordered
}

/// 生成请求的轮换名单
///
/// # 参数
/// - `candidates`: 规范候选列表（已排除在租）
/// - `history`: 本财年同组历史询问轨迹；本财年无其他请求时传空
///
/// # 返回
/// 重排后的名单，first_to_ask 为最早有起点的块的起点设备
pub fn order_rotation(
    rental_request_id: i64,
    candidates: &[RotationCandidate],
    history: &[RotationHistoryEntry],
) -> RotationList {
    if candidates.is_empty() {
        return RotationList::empty(rental_request_id);
    }

    let starts = resolve_start_points(candidates, history);
    let ordered = relinearize(candidates, &starts);
    let first_to_ask = ordered.first().map(|c| c.equipment_id);

    RotationList {
        rental_request_id,
        candidates: ordered,
        first_to_ask,
    }
}
