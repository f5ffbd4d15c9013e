diesel::table! {
    /// 以太坊区块表
    blocks (hash) {
        /// 区块哈希（主键）
        hash -> Varchar,
        /// 区块号
        number -> Int8,
        /// 交易数量
        tx_count -> Int4,
        /// Gas 使用量
        gas_used -> Int8,
        /// Gas 上限
        gas_limit -> Int8,
        /// 区块时间（UTC）
        ts -> Timestamptz,
        /// 原始区块 JSON（不含交易列表）
        json_data -> Jsonb,
        /// 入库时间，广播窗口按此列扫描
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// 以太坊交易表
    transactions (hash) {
        /// 交易哈希（主键）
        hash -> Varchar,
        block_hash -> Varchar,
        block_number -> Int8,
        /// 区块内序号
        transaction_index -> Int4,
        gas -> Int8,
        /// 单位 ether
        gas_price -> Numeric,
        /// 单位 ether
        value -> Numeric,
        /// 原始交易 JSON
        json_data -> Jsonb,
        created_at -> Timestamptz,
    }
}

diesel::allow_tables_to_appear_in_same_query!(blocks, transactions);
