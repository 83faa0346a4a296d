//! Packet - 生产者输入
//!
//! 上游阶段交给 dumper 节点的数据包。

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// 命名变量表
///
/// 模板渲染时使用的变量 (变量名 -> 值)。
/// `count` / `pts` / `streamIndex` 由 dispatch loop 每个包覆盖，其余键为用户静态数据。
pub type NamingData = serde_json::Map<String, serde_json::Value>;

/// 数据包 (拥有所有权)
///
/// `payload` 为引用计数的不可变缓冲区，入队时无需复制。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Packet {
    /// 显示时间戳
    pub pts: i64,

    /// 流索引
    pub stream_index: usize,

    /// 数据载荷 (零拷贝)
    pub payload: Bytes,
}

impl Packet {
    /// 创建数据包
    pub fn new(pts: i64, stream_index: usize, payload: impl Into<Bytes>) -> Self {
        Self {
            pts,
            stream_index,
            payload: payload.into(),
        }
    }

    /// 载荷字节数
    pub fn size(&self) -> usize {
        self.payload.len()
    }
}

/// 借用的数据包视图
///
/// 仅在传递它的同步调用期间有效。异步处理前必须通过 [`PacketRef::to_owned_packet`] 复制。
#[derive(Debug, Clone, Copy)]
pub struct PacketRef<'a> {
    /// 显示时间戳
    pub pts: i64,

    /// 流索引
    pub stream_index: usize,

    /// 载荷视图
    pub data: &'a [u8],
}

impl<'a> PacketRef<'a> {
    /// 创建视图
    pub fn new(pts: i64, stream_index: usize, data: &'a [u8]) -> Self {
        Self {
            pts,
            stream_index,
            data,
        }
    }

    /// 复制载荷，得到可跨任务传递的 [`Packet`]
    pub fn to_owned_packet(&self) -> Packet {
        Packet {
            pts: self.pts,
            stream_index: self.stream_index,
            payload: Bytes::copy_from_slice(self.data),
        }
    }
}

impl From<PacketRef<'_>> for Packet {
    fn from(view: PacketRef<'_>) -> Self {
        view.to_owned_packet()
    }
}
