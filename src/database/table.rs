pub struct Table;

// Timestamps are VARCHAR(25) in `%Y-%m-%d %H:%M:%S`.
// List and object columns hold JSON text.

impl Table {
    /// phone_numbers / emails: JSON arrays of strings
    pub const CUSTOMERS: &'static str = "CREATE TABLE IF NOT EXISTS customers(
            id VARCHAR(30) NOT NULL,
            company_name VARCHAR(100) NOT NULL,
            contact_name VARCHAR(100) NOT NULL,
            phone_numbers TEXT NOT NULL,
            emails TEXT NOT NULL,
            line_id VARCHAR(50) NULL,
            customer_type VARCHAR(30) NULL,
            business_type VARCHAR(30) NULL,
            province VARCHAR(50) NULL,
            address TEXT NULL,
            tax_id VARCHAR(20) NULL,
            presentation_status VARCHAR(30) NULL,
            contact_count INT NOT NULL,
            last_contact_date VARCHAR(25) NULL,
            interested_products TEXT NULL,
            responsible_person VARCHAR(50) NULL,
            customer_status VARCHAR(30) NOT NULL,
            how_found_us VARCHAR(30) NULL,
            other_channel VARCHAR(100) NULL,
            notes TEXT NULL,
            total_orders INT NOT NULL,
            total_value DOUBLE NOT NULL,
            created_at VARCHAR(25) NOT NULL,
            PRIMARY KEY (id)
        )
    ";
    pub const CUSTOMER_CONTACTS: &'static str = "CREATE TABLE IF NOT EXISTS customer_contacts(
            id VARCHAR(40) NOT NULL,
            customer_id VARCHAR(30) NOT NULL,
            contact_name VARCHAR(100) NOT NULL,
            line_id VARCHAR(50) NULL,
            phone_number VARCHAR(20) NOT NULL,
            email VARCHAR(100) NULL,
            PRIMARY KEY (id),
            FOREIGN KEY (customer_id) REFERENCES customers(id) ON DELETE CASCADE
        )
    ";
    pub const CUSTOMER_ACTIVITIES: &'static str = "CREATE TABLE IF NOT EXISTS customer_activities(
            id VARCHAR(30) NOT NULL,
            customer_id VARCHAR(30) NOT NULL,
            activity_type VARCHAR(30) NOT NULL,
            title VARCHAR(200) NOT NULL,
            description TEXT NULL,
            start_datetime VARCHAR(25) NOT NULL,
            end_datetime VARCHAR(25) NULL,
            priority VARCHAR(20) NULL,
            status VARCHAR(20) NULL,
            contact_person VARCHAR(100) NULL,
            responsible_person VARCHAR(100) NULL,
            reminder_type VARCHAR(30) NULL,
            created_at VARCHAR(25) NOT NULL,
            PRIMARY KEY (id),
            FOREIGN KEY (customer_id) REFERENCES customers(id) ON DELETE CASCADE
        )
    ";
    pub const CUSTOMER_NOTES: &'static str = "CREATE TABLE IF NOT EXISTS customer_notes(
            id VARCHAR(30) NOT NULL,
            customer_id VARCHAR(30) NOT NULL,
            content TEXT NOT NULL,
            author VARCHAR(100) NOT NULL,
            created_at VARCHAR(25) NOT NULL,
            PRIMARY KEY (id),
            FOREIGN KEY (customer_id) REFERENCES customers(id) ON DELETE CASCADE
        )
    ";
    /// fields / delivery: JSON objects
    pub const ORDERS: &'static str = "CREATE TABLE IF NOT EXISTS orders(
            id VARCHAR(30) NOT NULL,
            draft_id VARCHAR(30) NOT NULL,
            created_at VARCHAR(25) NOT NULL,
            customer_id VARCHAR(30) NULL,
            fields TEXT NOT NULL,
            delivery TEXT NOT NULL,
            action VARCHAR(30) NOT NULL,
            PRIMARY KEY (id)
        )
    ";
    /// position keeps the staging order; details is a JSON object
    pub const ORDER_PRODUCTS: &'static str = "CREATE TABLE IF NOT EXISTS order_products(
            order_id VARCHAR(30) NOT NULL,
            position INT NOT NULL,
            id BIGINT UNSIGNED NOT NULL,
            product_type VARCHAR(30) NOT NULL,
            material VARCHAR(50) NULL,
            details TEXT NOT NULL,
            PRIMARY KEY (order_id, position),
            FOREIGN KEY (order_id) REFERENCES orders(id) ON DELETE CASCADE
        )
    ";
    pub const TRACKED_ORDERS: &'static str = "CREATE TABLE IF NOT EXISTS tracked_orders(
            id VARCHAR(30) NOT NULL,
            customer VARCHAR(100) NOT NULL,
            items VARCHAR(200) NOT NULL,
            order_date VARCHAR(25) NOT NULL,
            due_date VARCHAR(25) NOT NULL,
            status VARCHAR(30) NOT NULL,
            value DOUBLE NOT NULL,
            progress TINYINT UNSIGNED NOT NULL,
            kind VARCHAR(10) NOT NULL,
            location VARCHAR(15) NOT NULL,
            department VARCHAR(15) NULL,
            PRIMARY KEY (id)
        )
    ";
    /// The whole estimation is kept as JSON in `body`.
    pub const PRICE_ESTIMATIONS: &'static str = "CREATE TABLE IF NOT EXISTS price_estimations(
            id VARCHAR(30) NOT NULL,
            created_at VARCHAR(25) NOT NULL,
            body TEXT NOT NULL,
            PRIMARY KEY (id)
        )
    ";
    pub const JOB_UPDATES: &'static str = "CREATE TABLE IF NOT EXISTS job_updates(
            id VARCHAR(30) NOT NULL,
            job_id VARCHAR(30) NOT NULL,
            kind VARCHAR(20) NOT NULL,
            body TEXT NOT NULL,
            created_at VARCHAR(25) NOT NULL,
            PRIMARY KEY (id),
            INDEX (job_id)
        )
    ";

    /// Creation order; referenced tables come first.
    pub const ALL: [&'static str; 9] = [
        Self::CUSTOMERS,
        Self::CUSTOMER_CONTACTS,
        Self::CUSTOMER_ACTIVITIES,
        Self::CUSTOMER_NOTES,
        Self::ORDERS,
        Self::ORDER_PRODUCTS,
        Self::TRACKED_ORDERS,
        Self::PRICE_ESTIMATIONS,
        Self::JOB_UPDATES,
    ];
}
