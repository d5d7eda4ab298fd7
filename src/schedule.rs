/// Skeleton body length for the fixed schedules (rows 8 through 33 on the
/// sheet), filled in manually by the finance team after submission review.
pub const SKELETON_ROWS: usize = 26;

/// Descriptor for one fixed-layout schedule. Schedules C through F share a
/// single template; only the labels differ.
#[derive(Debug, Clone, Copy)]
pub struct ScheduleTemplate {
    pub letter: char,
    /// Sheet subtitle at B2.
    pub subtitle: &'static str,
    /// Unit label under "Total Medicaid" at H6.
    pub unit_header: &'static str,
    /// Body label at B8.
    pub body_label: &'static str,
    /// Count label at H8.
    pub count_header: &'static str,
}

pub const FIXED_SCHEDULES: [ScheduleTemplate; 4] = [
    ScheduleTemplate {
        letter: 'C',
        subtitle: "Medicaid Managed Care Delivery Encounters Detail",
        unit_header: "Delivery",
        body_label: "Delivery Procedure Code",
        count_header: "Encounters",
    },
    ScheduleTemplate {
        letter: 'D',
        subtitle: "Medicaid Managed Care Delivery Receipts",
        unit_header: "Delivery",
        body_label: "Delivery Procedure Code",
        count_header: "Receipts",
    },
    ScheduleTemplate {
        letter: 'E',
        subtitle: "Medicaid Managed Care OB/GYN Surgical Encounters Detail",
        unit_header: "OB/GYN",
        body_label: "OB/GYN Surgical Delivery Procedure Code",
        count_header: "Surgical Encounters",
    },
    ScheduleTemplate {
        letter: 'F',
        subtitle: "Medicaid Managed Care OB/GYN Surgical Encounters Detail",
        unit_header: "OB/GYN",
        body_label: "OB/GYN Surgical Delivery Procedure Code",
        count_header: "Surgical Encounters",
    },
];
