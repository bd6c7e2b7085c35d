// ==========================================
// 设备轮换调度系统 - 轮换名单引擎
// ==========================================
// 红线: 名单每次请求新建; 接续依据历史询问轨迹
// 红线: 强制雇用不推进轮换位置
// ==========================================
// 职责: 规范顺序 → 在租排除 → 起点确定 → 重排编号
// 输入: 分组分块快照 + 财年窗口内询问历史
// 输出: 有序候选 + 首位询问设备
// ==========================================

mod builder;
mod core;


pub use builder::{RotationBuildOutcome, RotationListBuilder};
pub use core::{
    canonical_candidates, last_asked_in_block, order_rotation, relinearize,
    resolve_start_points, BlockStart,
};
