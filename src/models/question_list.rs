//! 题目列表
//!
//! 外部（界面/配置文件）拥有的有序题目列表，只提供按下标的增删改查。
//! 一次运行开始时由编译器读取，运行期间视为只读。

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult, BusinessError};
use crate::models::question::QuestionModel;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionList {
    items: Vec<QuestionModel>,
}

impl QuestionList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&QuestionModel> {
        self.items.get(index)
    }

    /// 替换指定位置的题目，返回旧值
    pub fn set(&mut self, index: usize, question: QuestionModel) -> AppResult<QuestionModel> {
        let len = self.items.len();
        let slot = self
            .items
            .get_mut(index)
            .ok_or(AppError::Business(BusinessError::IndexOutOfRange { index, len }))?;
        Ok(std::mem::replace(slot, question))
    }

    /// 在指定位置插入题目（index == len 时追加）
    pub fn insert(&mut self, index: usize, question: QuestionModel) -> AppResult<()> {
        let len = self.items.len();
        if index > len {
            return Err(AppError::Business(BusinessError::IndexOutOfRange {
                index,
                len,
            }));
        }
        self.items.insert(index, question);
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> AppResult<QuestionModel> {
        let len = self.items.len();
        if index >= len {
            return Err(AppError::Business(BusinessError::IndexOutOfRange {
                index,
                len,
            }));
        }
        Ok(self.items.remove(index))
    }

    pub fn push(&mut self, question: QuestionModel) {
        self.items.push(question);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, QuestionModel> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[QuestionModel] {
        &self.items
    }

    pub fn as_mut_slice(&mut self) -> &mut [QuestionModel] {
        &mut self.items
    }
}

impl From<Vec<QuestionModel>> for QuestionList {
    fn from(items: Vec<QuestionModel>) -> Self {
        Self { items }
    }
}

impl<'a> IntoIterator for &'a QuestionList {
    type Item = &'a QuestionModel;
    type IntoIter = std::slice::Iter<'a, QuestionModel>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> QuestionList {
        QuestionList::from(vec![
            QuestionModel::single(1, 3),
            QuestionModel::multiple(2, 4),
        ])
    }

    #[test]
    fn test_crud() {
        let mut list = sample();
        assert_eq!(list.len(), 2);

        list.insert(1, QuestionModel::text(3, vec![])).unwrap();
        assert_eq!(list.get(1).map(|q| q.ordinal), Some(3));

        let old = list.set(0, QuestionModel::single(7, 2)).unwrap();
        assert_eq!(old.ordinal, 1);
        assert_eq!(list.get(0).map(|q| q.ordinal), Some(7));

        let removed = list.remove(2).unwrap();
        assert_eq!(removed.ordinal, 2);
        assert_eq!(list.len(), 2);

        list.insert(2, QuestionModel::single(9, 2)).unwrap();
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn test_out_of_range() {
        let mut list = sample();
        assert!(list.get(5).is_none());
        assert!(matches!(
            list.set(5, QuestionModel::single(1, 2)),
            Err(AppError::Business(BusinessError::IndexOutOfRange { index: 5, len: 2 }))
        ));
        assert!(list.insert(3, QuestionModel::single(1, 2)).is_err());
        assert!(list.remove(2).is_err());
    }
}
