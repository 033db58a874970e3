//! Image Set Reconciliation
//!
//! 三种更新模式把 (oldImages, keepImages, uploadedImages) 折算成
//! 协调器需要的 toRemove / toAdd / 最终图片列表。

use serde::{Deserialize, Serialize};

/// 图片更新模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageUpdateMode {
    /// 新上传完全替换旧集合
    Replace,
    /// 保留 (keep 列表非空时按列表，否则全部旧图) 并追加上传
    Add,
    /// 只保留 keep 列表，无新上传
    Keep,
}

/// 对账结果
#[derive(Debug, Clone, PartialEq)]
pub struct ImagePlan {
    /// 期望的最终图片列表 (保留图在前，按原顺序；上传图在后，按提交顺序)
    pub final_images: Vec<String>,
    /// 不再被引用、需要备份后删除的文件
    pub to_remove: Vec<String>,
    /// 上传层已暂存、失败时需要回滚删除的文件
    pub to_add: Vec<String>,
}

/// 计算图片对账计划
pub fn reconcile(
    old: &[String],
    mode: ImageUpdateMode,
    keep: Option<&[String]>,
    uploaded: &[String],
) -> ImagePlan {
    let kept: Vec<String> = match mode {
        ImageUpdateMode::Replace => vec![],
        ImageUpdateMode::Add => match keep {
            Some(list) if !list.is_empty() => old
                .iter()
                .filter(|img| list.contains(img))
                .cloned()
                .collect(),
            _ => old.to_vec(),
        },
        ImageUpdateMode::Keep => {
            let list = keep.unwrap_or(&[]);
            old.iter()
                .filter(|img| list.contains(img))
                .cloned()
                .collect()
        }
    };

    let incoming: Vec<String> = match mode {
        ImageUpdateMode::Keep => vec![],
        _ => uploaded.to_vec(),
    };

    let mut final_images = kept;
    for img in &incoming {
        if !final_images.contains(img) {
            final_images.push(img.clone());
        }
    }

    // 重复提交已有路径不算新增：abort 时删 to_add 不能碰到在用文件
    let to_add: Vec<String> = incoming
        .into_iter()
        .filter(|img| !old.contains(img))
        .collect();

    let to_remove: Vec<String> = old
        .iter()
        .filter(|img| !final_images.contains(img))
        .cloned()
        .collect();

    ImagePlan {
        final_images,
        to_remove,
        to_add,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn imgs(paths: &[&str]) -> Vec<String> {
        paths.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_replace_removes_everything_old() {
        let plan = reconcile(
            &imgs(&["/uploads/products/a.png", "/uploads/products/b.png"]),
            ImageUpdateMode::Replace,
            None,
            &imgs(&["/uploads/products/c.png"]),
        );
        assert_eq!(plan.final_images, imgs(&["/uploads/products/c.png"]));
        assert_eq!(
            plan.to_remove,
            imgs(&["/uploads/products/a.png", "/uploads/products/b.png"])
        );
        assert_eq!(plan.to_add, imgs(&["/uploads/products/c.png"]));
    }

    #[test]
    fn test_add_with_empty_keep_list_keeps_all_old() {
        // add 模式下空 keep 列表等同于未提供：什么都不删
        let plan = reconcile(
            &imgs(&["/uploads/products/a.png"]),
            ImageUpdateMode::Add,
            Some(&[]),
            &imgs(&["/uploads/products/new1.png"]),
        );
        assert_eq!(
            plan.final_images,
            imgs(&["/uploads/products/a.png", "/uploads/products/new1.png"])
        );
        assert!(plan.to_remove.is_empty());
    }

    #[test]
    fn test_add_with_keep_list_drops_unlisted() {
        let plan = reconcile(
            &imgs(&["/uploads/products/a.png", "/uploads/products/b.png"]),
            ImageUpdateMode::Add,
            Some(&imgs(&["/uploads/products/b.png"])),
            &imgs(&["/uploads/products/c.png"]),
        );
        assert_eq!(
            plan.final_images,
            imgs(&["/uploads/products/b.png", "/uploads/products/c.png"])
        );
        assert_eq!(plan.to_remove, imgs(&["/uploads/products/a.png"]));
    }

    #[test]
    fn test_keep_mode_ignores_uploads() {
        let plan = reconcile(
            &imgs(&["/uploads/products/a.png", "/uploads/products/b.png"]),
            ImageUpdateMode::Keep,
            Some(&imgs(&["/uploads/products/a.png"])),
            &imgs(&["/uploads/products/ignored.png"]),
        );
        assert_eq!(plan.final_images, imgs(&["/uploads/products/a.png"]));
        assert_eq!(plan.to_remove, imgs(&["/uploads/products/b.png"]));
        assert!(plan.to_add.is_empty());
    }

    #[test]
    fn test_reupload_of_existing_image_is_not_staged() {
        // 提交的 "新" 图与现图同路径：保留在最终列表里，但绝不进 to_add
        let plan = reconcile(
            &imgs(&["/uploads/products/a.png", "/uploads/products/b.png"]),
            ImageUpdateMode::Replace,
            None,
            &imgs(&["/uploads/products/a.png"]),
        );
        assert_eq!(plan.final_images, imgs(&["/uploads/products/a.png"]));
        assert_eq!(plan.to_remove, imgs(&["/uploads/products/b.png"]));
        assert!(plan.to_add.is_empty());
    }

    #[test]
    fn test_keep_mode_with_empty_list_removes_all() {
        let plan = reconcile(
            &imgs(&["/uploads/products/a.png"]),
            ImageUpdateMode::Keep,
            Some(&[]),
            &[],
        );
        assert!(plan.final_images.is_empty());
        assert_eq!(plan.to_remove, imgs(&["/uploads/products/a.png"]));
    }
}
