// crates/sg_io/src/fields.rs

//! 字段描述系统
//!
//! SGB 容器中每个字段记录数据类型、逻辑形状和在文件中的位置。
//! 形状按行主序解释，例如 `[n_vertices, 3]` 的顶点坐标。

use serde::{Deserialize, Serialize};

/// 数据类型枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum DataType {
    /// 32位浮点
    F32 = 1,
    /// 64位浮点
    F64 = 2,
    /// 32位无符号整数
    U32 = 3,
    /// 8位无符号整数
    U8 = 5,
}

impl DataType {
    /// 返回单个元素的字节数
    pub fn element_size(&self) -> usize {
        match self {
            DataType::F32 => 4,
            DataType::F64 => 8,
            DataType::U32 => 4,
            DataType::U8 => 1,
        }
    }
}

/// 字段描述符
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// 字段名称
    pub name: String,
    /// 数据类型
    pub dtype: DataType,
    /// 元素数量
    pub count: u64,
    /// 逻辑形状，各维乘积等于 `count`
    pub shape: Vec<u64>,
    /// 文件中的偏移位置
    pub offset: u64,
    /// 数据大小（字节）
    pub size_raw: u64,
}

impl FieldDescriptor {
    /// 创建新的字段描述符
    pub fn new(name: impl Into<String>, dtype: DataType, shape: &[usize]) -> Self {
        let shape: Vec<u64> = shape.iter().map(|&d| d as u64).collect();
        let count = shape.iter().product();
        Self {
            name: name.into(),
            dtype,
            count,
            shape,
            offset: 0,
            size_raw: count * dtype.element_size() as u64,
        }
    }

    /// 设置偏移位置
    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    /// 描述符自洽：形状乘积等于元素数，字节数等于元素数乘元素大小
    pub fn is_consistent(&self) -> bool {
        let product: Option<u64> = self.shape.iter().try_fold(1u64, |acc, &d| acc.checked_mul(d));
        product == Some(self.count)
            && self.count.checked_mul(self.dtype.element_size() as u64) == Some(self.size_raw)
    }
}

/// 字段索引
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FieldIndex {
    /// 所有字段描述符
    pub fields: Vec<FieldDescriptor>,
}

impl FieldIndex {
    /// 创建新的空索引
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// 添加字段（同名字段覆盖）
    pub fn add(&mut self, field: FieldDescriptor) {
        self.fields.retain(|f| f.name != field.name);
        self.fields.push(field);
    }

    /// 通过名称查找字段
    pub fn find(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// 获取字段数量
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// 数据区总大小
    pub fn total_size(&self) -> u64 {
        self.fields.iter().map(|f| f.size_raw).sum()
    }
}
