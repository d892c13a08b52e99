//! Option lists offered by the curriculum form.
//!
//! Free-text values outside these lists are accepted everywhere; the lists are
//! suggestions, not an enumeration.

pub const ACADEMIC_LEVELS: &[&str] = &[
    "UG",
    "PG",
    "Diploma",
    "Certification",
    "Professional",
    "K-12 Extension",
];

pub const TEACHING_TYPES: &[&str] = &[
    "Theory",
    "Practical",
    "Hybrid",
    "Seminar-based",
    "Lab-centric",
    "Project-based",
];

pub const COURSE_TITLES: &[&str] = &[
    "Data Science & Machine Learning",
    "Full Stack Web Development",
    "Cloud Computing & DevOps",
    "Cybersecurity & Ethical Hacking",
    "Artificial Intelligence & Deep Learning",
    "Mobile App Development",
    "Blockchain & Cryptocurrency",
    "Internet of Things (IoT)",
    "Quantum Computing",
    "Digital Marketing & Analytics",
    "Product Management",
    "UI/UX Design",
    "Game Development",
    "Robotics & Automation",
    "Big Data & Analytics",
];

pub const SUBJECT_AREAS: &[&str] = &[
    "Computer Science & IT",
    "Engineering & Technology",
    "Business & Management",
    "Data Science & Analytics",
    "Design & Creative Arts",
    "Healthcare & Medicine",
    "Finance & Economics",
    "Marketing & Communications",
    "Mathematics & Statistics",
    "Physics & Applied Sciences",
    "Biotechnology & Life Sciences",
    "Environmental Science",
    "Education & Pedagogy",
    "Law & Legal Studies",
    "Social Sciences",
];

pub const INDUSTRY_FOCUS_OPTIONS: &[&str] = &[
    "Fintech & Banking",
    "Healthcare Technology",
    "E-commerce & Retail",
    "Automotive & Transportation",
    "Telecommunications",
    "Energy & Utilities",
    "Manufacturing & Industry 4.0",
    "Media & Entertainment",
    "Education Technology (EdTech)",
    "Agriculture Technology (AgriTech)",
    "Real Estate & PropTech",
    "Travel & Hospitality",
    "Gaming & Esports",
    "Cybersecurity",
    "Cloud Services & SaaS",
    "Artificial Intelligence & ML",
    "Blockchain & Web3",
    "Robotics & Automation",
    "Biotechnology & Pharmaceuticals",
    "Consulting & Professional Services",
];
