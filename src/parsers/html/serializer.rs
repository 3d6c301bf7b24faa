use std::io;

use html5ever::serialize::{serialize, SerializeOpts, TraversalScope};
use markup5ever_rcdom::{Handle, SerializableHandle};

/// 序列化节点的全部子节点（不含节点本身）
///
/// html5ever 的序列化器只做必要的转义：文本中的 `&`、`<`、`>` 和不换行空格，
/// 属性中的 `&`、`"` 和不换行空格。
pub fn serialize_children(node: &Handle) -> io::Result<String> {
    write_node(node, TraversalScope::ChildrenOnly(None))
}

/// 连同节点本身一起序列化
pub fn serialize_node(node: &Handle) -> io::Result<String> {
    write_node(node, TraversalScope::IncludeNode)
}

fn write_node(node: &Handle, traversal_scope: TraversalScope) -> io::Result<String> {
    let mut buf: Vec<u8> = Vec::new();
    let serializable: SerializableHandle = node.clone().into();
    serialize(
        &mut buf,
        &serializable,
        SerializeOpts {
            traversal_scope,
            ..Default::default()
        },
    )?;

    String::from_utf8(buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}
